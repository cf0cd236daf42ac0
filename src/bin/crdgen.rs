use atlas_k8s::crd::AtlasInfra;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&AtlasInfra::crd())?);
    Ok(())
}

use frontend_operator::crd::FrontendPage;
use kube::CustomResourceExt;

fn main() {
    let crd = FrontendPage::crd();
    let yaml = serde_yaml::to_string(&crd).expect("serialize CRD");
    println!("{yaml}");
}

//! # CRD Generator
//!
//! Prints the `KMSVaultSecret` and `PartialKMSVaultSecret`
//! CustomResourceDefinitions as a multi-document YAML stream.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/kms-vault-crds.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kms_vault_controller::crd::{KMSVaultSecret, PartialKMSVaultSecret};
use kube::core::CustomResourceExt;

fn main() {
    let crds = [KMSVaultSecret::crd(), PartialKMSVaultSecret::crd()];

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    println!("# If there are malformed YAML issues, fix them in the Rust code (src/crd/)");
    println!("# This file will be overwritten on every code update");
    println!("#");

    for crd in &crds {
        match serde_yaml::to_string(crd) {
            Ok(yaml) => {
                println!("---");
                print!("{yaml}");
            }
            Err(e) => {
                eprintln!("Failed to serialize CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }
}

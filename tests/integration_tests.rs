//! Integration tests for component interactions.
//!
//! These tests verify that encoding, signing and export work together and
//! agree with alloy's own EIP-712 implementation.

use alloy_primitives::{address, b256, Address, U256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{Eip712Domain, SolStruct};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

use credentials::KeySource;
use forwarder_core::api::NonceSource;
use forwarder_core::config::Config;
use forwarder_core::encoding::meta_renew_membership;
use forwarder_core::export::{RequestExporter, SignedRequestArtifact};
use forwarder_core::pipeline::{RenewalIntent, RenewalPipeline};
use forwarder_core::signing::{DigestSigner, ForwardRequest, SigningDomain};

// Well-known anvil test key (DO NOT USE IN PRODUCTION)
const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const SENDER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
const FORWARDER: Address = address!("497b11C99CB77920EFC63e4a5D7396B3709BcDB3");
const MEMBERSHIP: Address = address!("Aaf086EC89D311f3fcAB1B17A735d4c8D746DFcF");
const SEPOLIA: u64 = 11_155_111;

const EXPECTED_ARTIFACT: &str = r#"{
  "request": {
    "from": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
    "to": "0xAaf086EC89D311f3fcAB1B17A735d4c8D746DFcF",
    "value": "10000000000000000",
    "gas": 100000,
    "nonce": 0,
    "data": "0x48ce240c00000000000000000000000000000000000000000000000000000000000000010000000000000000000000000000000000000000000000000000000000278d00000000000000000000000000f39fd6e51aad88f6f4ce6ab8827279cfffb92266"
  },
  "signature": "0xac6596e485e4b49f45d3e0007cdf20cf48be442e0eef3a69d267664ab89689643a0918a21086c44cc32a4ba38f73444ef850d1c445f62b980da9e395d48737971c"
}
"#;

mod reference {
    alloy_sol_types::sol! {
        struct ForwardRequest {
            address from;
            address to;
            uint256 value;
            uint256 gas;
            uint256 nonce;
            bytes data;
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn key() -> PrivateKeySigner {
    TEST_PRIVATE_KEY.parse().unwrap()
}

fn intent() -> RenewalIntent {
    RenewalIntent::new(
        U256::from(1u64),
        U256::from(2_592_000u64),
        U256::from(10_000_000_000_000_000u64),
    )
}

fn pipeline() -> RenewalPipeline {
    RenewalPipeline::new(
        SigningDomain::minimal_forwarder(SEPOLIA, FORWARDER),
        MEMBERSHIP,
        100_000,
    )
}

fn config(export_path: &Path) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("FORWARDER_CHAIN_ID", SEPOLIA.to_string()),
        ("FORWARDER_ADDRESS", FORWARDER.to_string()),
        ("MEMBERSHIP_CONTRACT", MEMBERSHIP.to_string()),
        ("SIGNED_REQUEST_PATH", export_path.display().to_string()),
    ]);
    Config::from_vars(|name| vars.get(name).cloned()).unwrap()
}

struct FixedNonce(U256);

#[async_trait]
impl NonceSource for FixedNonce {
    async fn nonce(&self, _from: Address) -> forwarder_core::Result<U256> {
        Ok(self.0)
    }
}

/// Full pass: nonce read, encode, build, sign and export.
#[tokio::test]
async fn test_renewal_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signed_request.json");

    let pipeline = pipeline();
    let request = pipeline
        .prepare_renewal(&FixedNonce(U256::ZERO), SENDER, &intent())
        .await
        .unwrap();
    let signed = pipeline.sign(&request, key()).unwrap();

    assert_eq!(
        signed.digest(),
        b256!("c4beb159b484794f136575669c221a3b5aec19a860735abe4769442322f4c16e")
    );

    RequestExporter::new(&path).export(&signed).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), EXPECTED_ARTIFACT);
}

/// The workspace entry point loads the key and writes the configured artifact.
#[tokio::test]
async fn test_sign_renewal_writes_configured_artifact() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("renewal.json");

    let var = "GASLESS_INTEGRATION_SIGNER_KEY";
    std::env::set_var(var, TEST_PRIVATE_KEY);

    let artifact = gasless_renew::sign_renewal(
        &config(&path),
        &FixedNonce(U256::ZERO),
        &KeySource::env(var),
        &intent(),
    )
    .await
    .unwrap();

    std::env::remove_var(var);

    assert_eq!(artifact.to_json_pretty().unwrap(), EXPECTED_ARTIFACT);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), EXPECTED_ARTIFACT);
}

#[tokio::test]
async fn test_sign_renewal_without_key_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signed_request.json");

    let result = gasless_renew::sign_renewal(
        &config(&path),
        &FixedNonce(U256::ZERO),
        &KeySource::env("GASLESS_INTEGRATION_UNSET_KEY"),
        &intent(),
    )
    .await;

    assert!(result.is_err());
    assert!(!path.exists());
}

/// Our digest agrees with alloy's `SolStruct::eip712_signing_hash`.
#[test]
fn test_digest_matches_alloy_eip712() {
    let data = meta_renew_membership(U256::from(1u64), U256::from(2_592_000u64), SENDER).unwrap();
    let request = ForwardRequest::builder()
        .from(SENDER)
        .to(MEMBERSHIP)
        .value(U256::from(10_000_000_000_000_000u64))
        .gas(100_000)
        .nonce(U256::from(3u64))
        .data(data.clone())
        .build()
        .unwrap();

    let alloy_request = reference::ForwardRequest {
        from: SENDER,
        to: MEMBERSHIP,
        value: U256::from(10_000_000_000_000_000u64),
        gas: U256::from(100_000u64),
        nonce: U256::from(3u64),
        data: data.into_bytes(),
    };
    let alloy_domain = Eip712Domain::new(
        Some("MinimalForwarder".into()),
        Some("1".into()),
        Some(U256::from(SEPOLIA)),
        Some(FORWARDER),
        None,
    );

    let signer = DigestSigner::new(SigningDomain::minimal_forwarder(SEPOLIA, FORWARDER));
    assert_eq!(
        signer.domain().separator().unwrap(),
        alloy_domain.separator()
    );
    assert_eq!(request.struct_hash().unwrap(), alloy_request.eip712_hash_struct());
    assert_eq!(
        signer.digest(&request).unwrap(),
        alloy_request.eip712_signing_hash(&alloy_domain)
    );
}

/// A signature for one deployment does not verify under another.
#[test]
fn test_signature_is_bound_to_deployment() {
    let request = pipeline()
        .build_request(SENDER, U256::ZERO, &intent())
        .unwrap();
    let signed = pipeline().sign(&request, key()).unwrap();

    let other_chain = DigestSigner::new(SigningDomain::minimal_forwarder(1, FORWARDER));
    let other_forwarder = DigestSigner::new(SigningDomain::minimal_forwarder(SEPOLIA, MEMBERSHIP));

    assert!(pipeline().signer().verify(&request, signed.signature()).unwrap());
    assert!(!other_chain.verify(&request, signed.signature()).unwrap());
    assert!(!other_forwarder.verify(&request, signed.signature()).unwrap());
}

/// Re-exporting the same request yields byte-identical files, and the
/// artifact parses back into the signed request.
#[test]
fn test_export_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signed_request.json");
    let exporter = RequestExporter::new(&path);

    let request = pipeline()
        .build_request(SENDER, U256::from(5u64), &intent())
        .unwrap();

    exporter.export(&pipeline().sign(&request, key()).unwrap()).unwrap();
    let first = std::fs::read(&path).unwrap();
    exporter.export(&pipeline().sign(&request, key()).unwrap()).unwrap();
    let second = std::fs::read(&path).unwrap();
    assert_eq!(first, second);

    let artifact = SignedRequestArtifact::from_json(std::str::from_utf8(&second).unwrap()).unwrap();
    let (parsed, signature) = artifact.into_parts().unwrap();
    assert_eq!(parsed, request);
    assert!(pipeline().signer().verify(&parsed, &signature).unwrap());
}

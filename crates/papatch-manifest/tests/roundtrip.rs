use papatch_manifest::{Bundle, Entry, Manifest};

#[test]
fn encoded_manifest_keeps_wire_shape() {
    let manifest = Manifest {
        bundles: vec![Bundle {
            checksum: "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed".into(),
            size: 11,
            entries: vec![Entry {
                filename: "/bin/pa".into(),
                offset: 0,
                size: 11,
                size_z: 0,
                executable: true,
            }],
        }],
    };

    let encoded = manifest.to_gzip_json().unwrap();
    let decoded = Manifest::from_gzip_json(&encoded).unwrap();
    assert_eq!(decoded, manifest);

    let json = serde_json::to_value(&manifest).unwrap();
    assert_eq!(json["bundles"][0]["size"], "11");
    assert_eq!(json["bundles"][0]["entries"][0]["sizeZ"], "0");
    assert_eq!(manifest.total_size(), 11);
}

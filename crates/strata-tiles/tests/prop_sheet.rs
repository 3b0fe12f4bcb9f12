use strata_tiles::{Rgba8, StyleCatalog, StyleSheet, TEX_SIZE};

#[test]
fn sheet_registers_styles_in_id_order() {
    let sheet = StyleSheet::from_toml_str(
        r#"
        [[style]]
        id = 3
        floor = [10, 20, 30]

        [[style]]
        id = 1
        floor = [96, 140, 60]
        wall = [120, 100, 80]
        trim = [200, 200, 180]
    "#,
    )
    .expect("sheet");
    assert_eq!(sheet.styles.len(), 2);
    let mut cat = StyleCatalog::new();
    assert!(!sheet.apply(&mut cat));
    cat.create_texture_arrays(false);
    let t = cat.table();
    let one = t.get(1);
    assert_eq!(one.floor, 0);
    assert_eq!(one.wall, Some(1));
    assert_eq!(one.trim, Some(0));
    let three = t.get(3);
    assert_eq!(three.floor, 2);
    assert_eq!(three.wall, None);
    let layer = &cat.tex_array().unwrap().layers[2];
    assert_eq!(layer.len(), TEX_SIZE * TEX_SIZE);
    assert_eq!(layer[0], Rgba8::opaque(10, 20, 30));
}

#[test]
fn malformed_sheet_is_an_error() {
    assert!(StyleSheet::from_toml_str("[[style]]\nid = \"x\"\n").is_err());
    assert!(StyleSheet::from_toml_str("").unwrap().styles.is_empty());
}

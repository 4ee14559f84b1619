use bastok::lang::{lex, parse, Error, ErrorCode};
use bastok::mach::{emit, ShapeGenerator, ShapeTable};
use bastok::opt::Pass;
use bastok::settings::Settings;
use bastok::compile;
use std::rc::Rc;

fn emitted(s: &str) -> Vec<u8> {
    let settings = Settings::default();
    emit(&parse(&lex(s).unwrap()).unwrap(), &settings).unwrap().bytes
}

#[test]
fn layout_matches_the_interpreter() {
    assert_eq!(
        emitted("10 HOME\n20 GOTO 10"),
        vec![
            0x07, 0x08, 0x0A, 0x00, 0x97, 0x00, // 10 HOME
            0x0F, 0x08, 0x14, 0x00, 0xAB, b'1', b'0', 0x00, // 20 GOTO 10
            0x00, 0x00, 0x00, 0x00, // program terminator
        ]
    );
}

#[test]
fn address_side_map() {
    let settings = Settings {
        start_address: 0x4000,
        ..Settings::default()
    };
    let image = emit(&parse(&lex("10 HOME\n20 TEXT\n30 END").unwrap()).unwrap(), &settings)
        .unwrap();
    assert_eq!(image.addresses.get(&10), Some(&0x4000));
    assert_eq!(image.addresses.get(&20), Some(&0x4006));
    assert_eq!(image.addresses.get(&30), Some(&0x400C));
}

/// Constant extraction feeds a synthesized line 0 through to the
/// binary: both PRINTs read the variable, never the literal.
#[test]
fn hoisted_constants_reach_the_image() {
    let settings = Settings::default();
    let image = compile(
        "10 PRINT 5:PRINT 5",
        &settings,
        &[Pass::ExtractConstantValues],
    )
    .unwrap();
    assert_eq!(
        image.bytes,
        vec![
            0x09, 0x08, 0x00, 0x00, b'A', 0xD0, b'5', 0x00, // 0 A=5
            0x13, 0x08, 0x0A, 0x00, 0xBA, b'A', 0x3A, 0xBA, b'A', 0x00, // 10 PRINT A:PRINT A
            0x00, 0x00, 0x00, 0x00,
        ]
    );
}

#[test]
fn embed_splices_file_and_jumps_past_it() {
    let dir = std::env::temp_dir().join("bastok-embed-test");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("blob.bin"), [0xDE, 0xAD]).unwrap();
    let settings = Settings {
        source_file: dir.join("game.bas"),
        ..Settings::default()
    };
    let source = "10 $embed file=\"blob.bin\" var=AD\n20 END";
    let image = emit(&parse(&lex(source).unwrap()).unwrap(), &settings).unwrap();
    assert_eq!(
        image.bytes,
        vec![
            0x13, 0x08, 0x0A, 0x00, // line 10 header
            b'A', b'D', 0xD0, b'2', b'0', b'6', b'4', // AD=2064
            0x3A, 0xAB, b'2', b'0', // :GOTO 20
            0xDE, 0xAD, // the blob, at address 2064
            0x00, // line terminator
            0x19, 0x08, 0x14, 0x00, 0x80, 0x00, // 20 END
            0x00, 0x00, 0x00, 0x00,
        ]
    );
}

#[test]
fn embed_on_the_last_line_emits_end() {
    let dir = std::env::temp_dir().join("bastok-embed-end-test");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("b.bin"), [0x60]).unwrap();
    let settings = Settings {
        source_file: dir.join("game.bas"),
        ..Settings::default()
    };
    let image = emit(
        &parse(&lex("10 $embed file=\"b.bin\"").unwrap()).unwrap(),
        &settings,
    )
    .unwrap();
    // Body is END then the blob: 0x80, 0x60.
    assert_eq!(
        image.bytes,
        vec![0x08, 0x08, 0x0A, 0x00, 0x80, 0x60, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn missing_embed_file_is_a_directive_error() {
    let settings = Settings::default();
    let err = emit(
        &parse(&lex("10 $embed file=\"nowhere.bin\"").unwrap()).unwrap(),
        &settings,
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DirectiveError);
}

struct FixedShapes(Vec<u8>);

impl ShapeGenerator for FixedShapes {
    fn generate(&self, _source: &str) -> Result<ShapeTable, Error> {
        Ok(ShapeTable::from_bytes(self.0.clone()))
    }
}

#[test]
fn shape_directive_points_the_table_vector() {
    let dir = std::env::temp_dir().join("bastok-shape-test");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("logo.shp"), "1 up right down").unwrap();
    let settings = Settings {
        source_file: dir.join("game.bas"),
        shapes: Some(Rc::new(FixedShapes(vec![0x01, 0x00, 0x04, 0x00]))),
        ..Settings::default()
    };
    let image = emit(
        &parse(&lex("10 $shape file=\"logo.shp\"").unwrap()).unwrap(),
        &settings,
    )
    .unwrap();
    // POKE 232,21:POKE 233,8:END then the table at 8*256+21 = 2069.
    assert_eq!(
        image.bytes,
        vec![
            0x1A, 0x08, 0x0A, 0x00, // header
            0xB9, b'2', b'3', b'2', b',', b'2', b'1', 0x3A, // POKE 232,21:
            0xB9, b'2', b'3', b'3', b',', b'8', 0x3A, // POKE 233,8:
            0x80, // END
            0x01, 0x00, 0x04, 0x00, // table bytes
            0x00, // line terminator
            0x00, 0x00, 0x00, 0x00,
        ]
    );
}

#[test]
fn shape_without_subsystem_is_a_directive_error() {
    let settings = Settings::default();
    let err = emit(
        &parse(&lex("10 $shape file=\"logo.shp\"").unwrap()).unwrap(),
        &settings,
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DirectiveError);
    assert!(err.to_string().contains("SHAPE SUBSYSTEM"));
}

#[test]
fn program_too_large_for_memory_overflows() {
    let mut source = String::new();
    for i in 0..4000 {
        source.push_str(&format!("{} PRINT \"0123456789ABCDEF\"\n", i));
    }
    let settings = Settings::default();
    let err = emit(&parse(&lex(&source).unwrap()).unwrap(), &settings).unwrap_err();
    assert_eq!(err.code(), ErrorCode::OverflowError);
}

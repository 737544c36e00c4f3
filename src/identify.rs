// The identification system gets its own file in case it grows to stitch together more than one
// format crate down the line.
use wmf2svg_core::identify::{FileInfo, IdentifyFn};
use wmf2svg_wmf::Wmf;

static SHALLOW_SCAN: [IdentifyFn; 1] = [Wmf::identify];

static DEEP_SCAN: [IdentifyFn; 1] = [Wmf::identify_deep];

pub(crate) fn identify_file(input: &str, deep_scan: bool) {
    let data = std::fs::read(input).expect("Unable to open file for identification!");

    let mut identified_types: Vec<FileInfo> = vec![];
    let scan_list = if deep_scan { &DEEP_SCAN } else { &SHALLOW_SCAN };

    for identifier in scan_list {
        if let Some(identity) = identifier(&data) {
            identified_types.push(identity);
        }
    }

    match identified_types.len() {
        0 => println!("{input}: data"),
        1 => {
            println!("{input}: {}", identified_types[0].info);
            if let Some(payload) = identified_types[0].payload.as_ref() {
                print_payload(payload);
            }
        }
        _ => {
            println!("{input}: Multiple possible filetypes identified:");
            for info in &identified_types {
                println!("- {}", info.info);
            }
        }
    }
}

/// Deep identification on a WMF re-renders it to SVG; print a byte count rather than dumping the
/// whole document to the terminal.
fn print_payload(payload: &[u8]) {
    println!("    - rendered SVG payload: {} bytes", payload.len());
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // ZIP extraction -> rels lookup -> model XML -> mesh; errors are fine, panics are not
    let _ = threemf_merge::Model::from_reader(Cursor::new(data));
    let _ = threemf_merge::inspect(Cursor::new(data));
});

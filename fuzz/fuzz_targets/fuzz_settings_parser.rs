#![no_main]

use libfuzzer_sys::fuzz_target;
use threemf_merge::SettingsDocument;

fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data)
        && let Ok(settings) = SettingsDocument::from_xml(xml)
    {
        // Whatever parses must serialize again
        let _ = settings.to_xml_string();
    }
});

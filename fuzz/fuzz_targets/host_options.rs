#![no_main]

use ferrous_host::{HostOptions, MapConfigSource};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = match std::str::from_utf8(data) {
        Ok(text) => text,
        Err(_) => return,
    };

    // Malformed documents must fail cleanly, never panic
    if let Ok(options) = HostOptions::from_json(text) {
        let _ = options.validate();
        let _ = options.socket_addr();
    }

    let mut fields = text.splitn(4, '\n');
    let mut source = MapConfigSource::new();
    for key in ["port", "max_concurrent_requests", "overload_policy", "bind_address"] {
        if let Some(value) = fields.next() {
            source = source.set(key, value);
        }
    }
    let _ = HostOptions::from_source(&source);
});

pub const SAMPLE_METER: &str = r#"{
    "name": "sample meter",
    "order": "msr",
    "common": { "fncode": 4 },
    "groups": { "config": ["Info"], "runtime": ["Meter", "Status"] },
    "fields": {
        "InfoModel": { "register": 0, "datatype": "uint16" },
        "InfoSerialNumber": { "register": 6, "datatype": "uint64" },
        "InfoName": { "register": 10, "words": 8, "datatype": "string_ascii" },
        "MeterPower": { "register": 29, "datatype": "int32", "nan": true, "unit": "W" },
        "MeterEnergy": { "register": 40, "datatype": "uint32", "scale": 2, "unit": "kWh" },
        "MeterFrequency": { "register": 100, "datatype": "uint16", "scale": 1, "unit": "Hz" },
        "StatusFlags": { "register": 120, "datatype": "bitfield16" }
    }
}"#;

pub const LSR_METER: &str = r#"{
    "name": "swapped meter",
    "order": "lsr",
    "fields": {
        "Energy": { "register": 0, "datatype": "uint32" },
        "Power": { "register": 2, "datatype": "float32" }
    }
}"#;

pub const BAD_FNCODE: &str = r#"{
    "name": "broken",
    "fields": {
        "Power": { "register": 0, "datatype": "int16", "fncode": 9 }
    }
}"#;

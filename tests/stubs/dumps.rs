pub const SAMPLE_METER: &str = "# sample meter
0: 0FD3
6: 0000 0000 0000 3039
10: 4D45 5445 5231 2020 0000 0000 0000 0000
29: 8000 0000
40: 0x0001, 0x0000
100: 0258
";

/// 0x00012345 and 325218.8125 with the low word first
pub const LSR_METER: &str = "RegisterData{
\t0x00000000: 23450001CC5A489E
}";

pub const MALFORMED: &str = "0: 0001
this line is not a register
";

/// ADAM-4117, all channels 0 to 150 mV
pub const ADAM_4117_01: &str = "0: 02AC 02D4 030A";

/// ADAM-4117, all channels +/-150 mV
pub const ADAM_4117_02: &str = "0: 81F7 829D 827A 8232";

/// ADAM-4118, mixed channel types
pub const ADAM_4118_01: &str = "0: 3709 373D 842E FFFF FFFF 84C2 A083 9C8E";

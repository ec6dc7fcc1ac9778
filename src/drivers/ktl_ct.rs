//! CSI KTL-CT series inverters

use once_cell::sync::Lazy;
use rangeset::RangeSet;

use crate::data_mgmt::{
    read_fixed_scale, read_flags, read_value, Bitmaskable, DecodeError, DecodeOptions, Decimal,
    RtValue,
};
use crate::registers::{
    DataType, DeviceFamily, ReadFunction, ReadGroup, ReferenceDescriptor, RegisterTable, Snapshot,
};

const fn input(name: &'static str, address: u32, data_type: DataType) -> ReferenceDescriptor {
    ReferenceDescriptor::new(name, address, 0, data_type, ReadFunction::InputRegister)
}

pub const INFO_INVERTER_MODEL: ReferenceDescriptor =
    input("InfoInverterModel", 0x00, DataType::UInt16);
pub const INFO_SERIAL_NUMBER: ReferenceDescriptor =
    input("InfoSerialNumber", 0x06, DataType::UInt64);
pub const INFO_INVERTER_MODEL_NAME: ReferenceDescriptor = ReferenceDescriptor::new(
    "InfoInverterModelName",
    0x0A,
    20,
    DataType::StringAscii,
    ReadFunction::InputRegister,
);
/// kWh
pub const INVERTER_ACTIVE_ENERGY_DELIVERED: ReferenceDescriptor =
    input("InverterActiveEnergyDelivered", 0x16, DataType::UInt32);
/// 0.1 kWh
pub const INVERTER_ACTIVE_ENERGY_DELIVERED_TODAY: ReferenceDescriptor =
    input("InverterActiveEnergyDeliveredToday", 0x18, DataType::UInt16);
/// 0.001
pub const INVERTER_POWER_FACTOR: ReferenceDescriptor =
    input("InverterPowerFactor", 0x1A, DataType::UInt16);
/// 0.1 kW
pub const INVERTER_ACTIVE_POWER_TOTAL: ReferenceDescriptor =
    input("InverterActivePowerTotal", 0x1D, DataType::UInt16);
/// 0.1 Hz
pub const INVERTER_FREQUENCY: ReferenceDescriptor =
    input("InverterFrequency", 0x2B, DataType::UInt16);
pub const STATUS_FAULT1: ReferenceDescriptor = input("StatusFault1", 0x37, DataType::Bitfield16);

pub const KTL_CT_REGISTERS: &[ReferenceDescriptor] = &[
    INFO_INVERTER_MODEL,
    input("InfoFirmwareVersion", 0x05, DataType::UInt16),
    INFO_SERIAL_NUMBER,
    INFO_INVERTER_MODEL_NAME,
    INVERTER_ACTIVE_ENERGY_DELIVERED,
    INVERTER_ACTIVE_ENERGY_DELIVERED_TODAY,
    // 0.0001 %
    input("InverterEfficiency", 0x19, DataType::UInt16),
    INVERTER_POWER_FACTOR,
    INVERTER_ACTIVE_POWER_TOTAL,
    // 0.1 kVA
    input("InverterApparentPowerTotal", 0x1E, DataType::UInt16),
    // 0.1 V
    input("InverterVoltageLineLinePhaseAPhaseB", 0x1F, DataType::UInt16),
    input("InverterVoltageLineLinePhaseBPhaseC", 0x20, DataType::UInt16),
    input("InverterVoltageLineLinePhaseCPhaseA", 0x21, DataType::UInt16),
    // 0.1 A
    input("InverterCurrentPhaseA", 0x22, DataType::UInt16),
    input("InverterCurrentPhaseB", 0x23, DataType::UInt16),
    input("InverterCurrentPhaseC", 0x24, DataType::UInt16),
    input("InverterPv1Voltage", 0x25, DataType::UInt16),
    input("InverterPv1Current", 0x26, DataType::UInt16),
    input("InverterPv2Voltage", 0x27, DataType::UInt16),
    input("InverterPv2Current", 0x28, DataType::UInt16),
    input("InverterPv3Voltage", 0x29, DataType::UInt16),
    input("InverterPv3Current", 0x2A, DataType::UInt16),
    INVERTER_FREQUENCY,
    // 0.1 C
    input("InverterModuleTemperature", 0x2C, DataType::UInt16),
    input("InverterInternalTemperature", 0x2D, DataType::UInt16),
    input("InverterTransformerTemperature", 0x2E, DataType::UInt16),
    input("StatusMode", 0x2F, DataType::UInt16),
    input("StatusPermanentFault", 0x34, DataType::UInt16),
    input("StatusWarn", 0x35, DataType::UInt16),
    input("StatusFault0", 0x36, DataType::UInt16),
    STATUS_FAULT1,
    input("StatusFault2", 0x38, DataType::UInt16),
    input("StatusFault3", 0x39, DataType::UInt16),
    input("StatusFault4", 0x3A, DataType::UInt16),
];

const CONFIG_PREFIXES: [&str; 2] = ["Info", "Config"];
const RUNTIME_PREFIXES: [&str; 2] = ["Inverter", "Status"];

static CONFIG_ADDRESS_SET: Lazy<RangeSet> =
    Lazy::new(|| RegisterTable::new(KTL_CT_REGISTERS).address_set_for_prefixes(&CONFIG_PREFIXES));

static RUNTIME_ADDRESS_SET: Lazy<RangeSet> = Lazy::new(|| {
    RegisterTable::new(KTL_CT_REGISTERS).address_set_for_prefixes(&RUNTIME_PREFIXES)
});

/// Fault 1 register flags
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KtlCtFault1 {
    Protect0190,
    Protect0180,
    Protect0170,
    IsolationErr,
    GfciErr,
    Protect0160,
    PvReverse,
    Protect0150,
    Protect0140,
    GridVoltageOutsideLimit09,
    Protect0270,
    Protect0130,
    Protect0120,
    AcContErr,
    Protect0110,
    Protect0100,
}

impl KtlCtFault1 {
    pub const ALL: [KtlCtFault1; 16] = [
        KtlCtFault1::Protect0190,
        KtlCtFault1::Protect0180,
        KtlCtFault1::Protect0170,
        KtlCtFault1::IsolationErr,
        KtlCtFault1::GfciErr,
        KtlCtFault1::Protect0160,
        KtlCtFault1::PvReverse,
        KtlCtFault1::Protect0150,
        KtlCtFault1::Protect0140,
        KtlCtFault1::GridVoltageOutsideLimit09,
        KtlCtFault1::Protect0270,
        KtlCtFault1::Protect0130,
        KtlCtFault1::Protect0120,
        KtlCtFault1::AcContErr,
        KtlCtFault1::Protect0110,
        KtlCtFault1::Protect0100,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up a flag by bit offset; `None` for unsupported offsets
    pub fn for_code(code: u32) -> Option<Self> {
        KtlCtFault1::ALL.into_iter().find(|f| f.code() == code)
    }

    pub fn description(self) -> &'static str {
        match self {
            KtlCtFault1::IsolationErr => "Isolation error",
            KtlCtFault1::GfciErr => "GFCI error",
            KtlCtFault1::PvReverse => "PV reverse connection",
            KtlCtFault1::GridVoltageOutsideLimit09 => "Grid voltage outside limit",
            KtlCtFault1::AcContErr => "AC contactor error",
            _ => "Protection trip",
        }
    }
}

impl Bitmaskable for KtlCtFault1 {
    fn bit_offset(self) -> u32 {
        self.code()
    }
}

/// The KTL-CT device family
#[derive(Clone, Copy, Debug, Default)]
pub struct KtlCt;

impl KtlCt {
    pub fn config_address_set() -> RangeSet {
        CONFIG_ADDRESS_SET.clone()
    }

    pub fn runtime_address_set() -> RangeSet {
        RUNTIME_ADDRESS_SET.clone()
    }

    /// Config and runtime addresses combined
    pub fn address_set() -> RangeSet {
        let mut set = KtlCt::config_address_set();
        set.extend_from(&RUNTIME_ADDRESS_SET);
        set
    }
}

impl DeviceFamily for KtlCt {
    fn name(&self) -> &str {
        "CSI KTL-CT"
    }

    fn registers(&self) -> RegisterTable<'_> {
        RegisterTable::new(KTL_CT_REGISTERS)
    }

    fn group_of(&self, reference: &ReferenceDescriptor) -> Option<ReadGroup> {
        if reference.has_prefix(&CONFIG_PREFIXES) {
            Some(ReadGroup::Config)
        } else if reference.has_prefix(&RUNTIME_PREFIXES) {
            Some(ReadGroup::Runtime)
        } else {
            None
        }
    }
}

/// Typed view of a KTL-CT snapshot
pub struct KtlCtData<'a> {
    snapshot: &'a Snapshot,
    opts: DecodeOptions,
}

impl<'a> KtlCtData<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        KtlCtData {
            snapshot,
            opts: DecodeOptions::with_order(KtlCt.word_order()),
        }
    }

    fn unsigned(&self, reference: &ReferenceDescriptor) -> Result<Option<u64>, DecodeError> {
        Ok(match read_value(self.snapshot, reference, &self.opts)? {
            Some(RtValue::UInt(v)) => Some(v),
            _ => None,
        })
    }

    fn scaled(
        &self,
        reference: &ReferenceDescriptor,
        scale: u32,
    ) -> Result<Option<Decimal>, DecodeError> {
        read_fixed_scale(self.snapshot, reference, &self.opts, scale)
    }

    pub fn model(&self) -> Result<Option<u64>, DecodeError> {
        self.unsigned(&INFO_INVERTER_MODEL)
    }

    pub fn serial_number(&self) -> Result<Option<u64>, DecodeError> {
        self.unsigned(&INFO_SERIAL_NUMBER)
    }

    pub fn model_name(&self) -> Result<Option<String>, DecodeError> {
        Ok(
            match read_value(self.snapshot, &INFO_INVERTER_MODEL_NAME, &self.opts)? {
                Some(RtValue::String(s)) => Some(s),
                _ => None,
            },
        )
    }

    /// Lifetime energy, kWh
    pub fn active_energy_delivered(&self) -> Result<Option<Decimal>, DecodeError> {
        self.scaled(&INVERTER_ACTIVE_ENERGY_DELIVERED, 0)
    }

    /// Energy today, kWh
    pub fn active_energy_delivered_today(&self) -> Result<Option<Decimal>, DecodeError> {
        self.scaled(&INVERTER_ACTIVE_ENERGY_DELIVERED_TODAY, 1)
    }

    pub fn power_factor(&self) -> Result<Option<Decimal>, DecodeError> {
        self.scaled(&INVERTER_POWER_FACTOR, 3)
    }

    /// Active power, kW
    pub fn active_power(&self) -> Result<Option<Decimal>, DecodeError> {
        self.scaled(&INVERTER_ACTIVE_POWER_TOTAL, 1)
    }

    /// Line frequency, Hz
    pub fn frequency(&self) -> Result<Option<Decimal>, DecodeError> {
        self.scaled(&INVERTER_FREQUENCY, 1)
    }

    pub fn fault1(&self) -> Result<Option<Vec<KtlCtFault1>>, DecodeError> {
        read_flags(self.snapshot, &STATUS_FAULT1, self.opts.order, &KtlCtFault1::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_mgmt::words::encode_string;
    use crate::registers::RegisterStore;

    #[test]
    fn test_address_sets() {
        assert_eq!(KtlCt::config_address_set().to_string(), "[0, 5-29]");
        assert_eq!(KtlCt::runtime_address_set().to_string(), "[22-26, 29-47, 52-58]");
        assert_eq!(KtlCt::address_set().to_string(), "[0, 5-47, 52-58]");
    }

    #[test]
    fn test_family_sets_match_prefix_sets() {
        let config = KtlCt.address_sets(Some(ReadGroup::Config));
        assert_eq!(config.len(), 1);
        assert_eq!(config[&ReadFunction::InputRegister], KtlCt::config_address_set());
        let runtime = KtlCt.address_sets(Some(ReadGroup::Runtime));
        assert_eq!(runtime[&ReadFunction::InputRegister], KtlCt::runtime_address_set());
    }

    #[test]
    fn test_fault1_for_code() {
        assert_eq!(KtlCtFault1::for_code(3), Some(KtlCtFault1::IsolationErr));
        assert_eq!(KtlCtFault1::for_code(15), Some(KtlCtFault1::Protect0100));
        assert_eq!(KtlCtFault1::for_code(16), None);
        for f in KtlCtFault1::ALL {
            assert_eq!(KtlCtFault1::for_code(f.code()), Some(f));
        }
    }

    #[test]
    fn test_typed_view() {
        let store = RegisterStore::new();
        store.update(|h| {
            h.save_word(0x00, 0x0FD3);
            h.save_words(0x06, &[0, 0, 0x0001, 0x0002]);
            h.save_words(0x0A, &encode_string("CSI-60KTL-CT", 20));
            h.save_words(0x16, &[0x0001, 0x0000]);
            h.save_word(0x18, 1234);
            h.save_word(0x1A, 998);
            h.save_word(0x1D, 503);
            h.save_word(0x2B, 600);
            h.save_word(0x37, (1 << 3) | (1 << 13));
            true
        });
        let snap = store.snapshot();
        let data = KtlCtData::new(&snap);

        assert_eq!(data.model().unwrap(), Some(0x0FD3));
        assert_eq!(data.serial_number().unwrap(), Some(0x0001_0002));
        assert_eq!(data.model_name().unwrap().as_deref(), Some("CSI-60KTL-CT"));
        assert_eq!(data.active_energy_delivered().unwrap().unwrap().to_string(), "65536");
        assert_eq!(
            data.active_energy_delivered_today().unwrap().unwrap().to_string(),
            "123.4"
        );
        assert_eq!(data.power_factor().unwrap().unwrap().to_string(), "0.998");
        assert_eq!(data.active_power().unwrap().unwrap().to_string(), "50.3");
        assert_eq!(data.frequency().unwrap().unwrap().to_string(), "60.0");
        assert_eq!(
            data.fault1().unwrap(),
            Some(vec![KtlCtFault1::IsolationErr, KtlCtFault1::AcContErr])
        );
    }

    #[test]
    fn test_typed_view_absent_values() {
        let snap = RegisterStore::new().snapshot();
        let data = KtlCtData::new(&snap);
        assert_eq!(data.model().unwrap(), None);
        assert_eq!(data.frequency().unwrap(), None);
        assert_eq!(data.fault1().unwrap(), None);
    }
}

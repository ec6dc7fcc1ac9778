//! Register reference descriptors
//!
//! A [`ReferenceDescriptor`] names one logical device field and says where it
//! lives (address and word length), how it is read (the read function) and how
//! its words are interpreted (the data type). Device families declare their
//! descriptors once, either as static tables or from a JSON driver document,
//! and build read plans from them.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rangeset::RangeSet;
use serde::{Deserialize, Serialize};

use crate::data_mgmt::words::WordOrder;

/// How the words of a field are interpreted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
    Bitfield16,
    Bitfield32,
    #[serde(rename = "string_ascii")]
    StringAscii,
    #[serde(rename = "string_utf8")]
    StringUtf8,
    Bytes,
}

impl DataType {
    pub const ALL: [DataType; 14] = [
        DataType::Boolean,
        DataType::UInt16,
        DataType::Int16,
        DataType::UInt32,
        DataType::Int32,
        DataType::UInt64,
        DataType::Int64,
        DataType::Float32,
        DataType::Float64,
        DataType::Bitfield16,
        DataType::Bitfield32,
        DataType::StringAscii,
        DataType::StringUtf8,
        DataType::Bytes,
    ];

    /// Natural width in 16-bit words, or 0 for variable-length types
    pub const fn word_length(self) -> u32 {
        match self {
            DataType::Boolean | DataType::UInt16 | DataType::Int16 | DataType::Bitfield16 => 1,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 | DataType::Bitfield32 => 2,
            DataType::UInt64 | DataType::Int64 | DataType::Float64 => 4,
            DataType::StringAscii | DataType::StringUtf8 | DataType::Bytes => 0,
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            DataType::UInt16
                | DataType::Int16
                | DataType::UInt32
                | DataType::Int32
                | DataType::UInt64
                | DataType::Int64
                | DataType::Bitfield16
                | DataType::Bitfield32
        )
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, DataType::Int16 | DataType::Int32 | DataType::Int64)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub const fn is_string(self) -> bool {
        matches!(self, DataType::StringAscii | DataType::StringUtf8)
    }

    pub const fn name(self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::UInt16 => "uint16",
            DataType::Int16 => "int16",
            DataType::UInt32 => "uint32",
            DataType::Int32 => "int32",
            DataType::UInt64 => "uint64",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Bitfield16 => "bitfield16",
            DataType::Bitfield32 => "bitfield32",
            DataType::StringAscii => "string_ascii",
            DataType::StringUtf8 => "string_utf8",
            DataType::Bytes => "bytes",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown data type '{}'", s))
    }
}

/// The read function (address space) a field is read with
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ReadFunction {
    Coil,
    DiscreteInput,
    #[default]
    HoldingRegister,
    InputRegister,
}

impl ReadFunction {
    pub const ALL: [ReadFunction; 4] = [
        ReadFunction::Coil,
        ReadFunction::DiscreteInput,
        ReadFunction::HoldingRegister,
        ReadFunction::InputRegister,
    ];

    /// Modbus function code used to read this address space
    pub const fn code(self) -> u8 {
        match self {
            ReadFunction::Coil => 1,
            ReadFunction::DiscreteInput => 2,
            ReadFunction::HoldingRegister => 3,
            ReadFunction::InputRegister => 4,
        }
    }

    pub fn for_code(code: u8) -> Option<Self> {
        ReadFunction::ALL.into_iter().find(|f| f.code() == code)
    }
}

impl fmt::Display for ReadFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadFunction::Coil => "coil",
            ReadFunction::DiscreteInput => "discrete_input",
            ReadFunction::HoldingRegister => "holding_register",
            ReadFunction::InputRegister => "input_register",
        };
        f.write_str(name)
    }
}

/// One logical device field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDescriptor {
    pub name: Cow<'static, str>,
    pub address: u32,
    /// Explicit word length; 0 means use the data type's natural width
    #[serde(default)]
    pub word_length: u32,
    pub data_type: DataType,
    #[serde(default)]
    pub function: ReadFunction,
}

impl ReferenceDescriptor {
    pub const fn new(
        name: &'static str,
        address: u32,
        word_length: u32,
        data_type: DataType,
        function: ReadFunction,
    ) -> Self {
        ReferenceDescriptor {
            name: Cow::Borrowed(name),
            address,
            word_length,
            data_type,
            function,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn effective_word_length(&self) -> u32 {
        if self.word_length > 0 {
            self.word_length
        } else {
            self.data_type.word_length()
        }
    }

    /// Inclusive address range, or `None` for fields with no words
    pub fn address_range(&self) -> Option<(u32, u32)> {
        let len = self.effective_word_length();
        if len == 0 {
            return None;
        }
        Some((self.address, self.address.saturating_add(len - 1)))
    }

    pub fn has_prefix<S: AsRef<str>>(&self, prefixes: &[S]) -> bool {
        prefixes.iter().any(|p| self.name.starts_with(p.as_ref()))
    }
}

/// Build an address set from descriptors; zero-length descriptors are skipped
pub fn address_set<'a>(refs: impl IntoIterator<Item = &'a ReferenceDescriptor>) -> RangeSet {
    let mut set = RangeSet::new();
    for r in refs {
        if let Some((first, last)) = r.address_range() {
            // address_range() never yields first > last
            let _ = set.add_range(first, last);
        }
    }
    set
}

/// The two read groups of a device family
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadGroup {
    /// Rarely changing identity and settings data
    Config,
    /// Frequently polled measurement and status data
    Runtime,
}

impl FromStr for ReadGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "config" => Ok(ReadGroup::Config),
            "runtime" => Ok(ReadGroup::Runtime),
            _ => Err(format!("Unknown read group '{}'", s)),
        }
    }
}

/// Borrowed view of a descriptor collection
#[derive(Clone, Copy, Debug)]
pub struct RegisterTable<'a> {
    descriptors: &'a [ReferenceDescriptor],
}

impl<'a> RegisterTable<'a> {
    pub const fn new(descriptors: &'a [ReferenceDescriptor]) -> Self {
        RegisterTable { descriptors }
    }

    pub fn descriptors(&self) -> &'a [ReferenceDescriptor] {
        self.descriptors
    }

    pub fn iter(&self) -> std::slice::Iter<'a, ReferenceDescriptor> {
        self.descriptors.iter()
    }

    pub fn get(&self, name: &str) -> Option<&'a ReferenceDescriptor> {
        self.descriptors.iter().find(|r| r.name == name)
    }

    pub fn address_set(&self) -> RangeSet {
        address_set(self.descriptors)
    }

    /// Address set of the descriptors whose name starts with any prefix
    pub fn address_set_for_prefixes<S: AsRef<str>>(&self, prefixes: &[S]) -> RangeSet {
        address_set(self.descriptors.iter().filter(|r| r.has_prefix(prefixes)))
    }
}

/// A device family: a register table plus the conventions for reading it
pub trait DeviceFamily {
    fn name(&self) -> &str;

    fn registers(&self) -> RegisterTable<'_>;

    fn word_order(&self) -> WordOrder {
        WordOrder::MostSignificantFirst
    }

    /// Which read group a descriptor belongs to; `None` excludes it from group reads
    fn group_of(&self, reference: &ReferenceDescriptor) -> Option<ReadGroup>;

    /// Address sets per read function for one group, or for all descriptors
    fn address_sets(&self, group: Option<ReadGroup>) -> BTreeMap<ReadFunction, RangeSet> {
        let mut sets: BTreeMap<ReadFunction, RangeSet> = BTreeMap::new();
        for r in self.registers().iter() {
            if group.is_some() && self.group_of(r) != group {
                continue;
            }
            if let Some((first, last)) = r.address_range() {
                let _ = sets.entry(r.function).or_default().add_range(first, last);
            }
        }
        sets
    }
}

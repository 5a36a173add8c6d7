//! Driver operations in native form, and their replies.
//!
//! An [`Operation`] is built on the caller's thread from already-validated
//! native values and executed later by a worker against the handle's
//! driver. Each variant maps to exactly one driver call, except
//! `ClearRitXit` which issues two.

use rigbridge_core::error::{Error, Result};
use rigbridge_core::native::*;
use rigbridge_core::types::SerialParam;
use rigbridge_core::{Channel, DriverResult, RigDriver, Status};

/// One blocking driver call with its native arguments.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operation {
    SetFreq { vfo: VfoBits, freq: f64 },
    GetFreq { vfo: VfoBits },
    SetMode { vfo: VfoBits, mode: ModeBits, width: i64 },
    GetMode { vfo: VfoBits },
    SetVfo { vfo: VfoBits },
    GetVfo,

    SetPtt { vfo: VfoBits, ptt: u32 },
    GetPtt { vfo: VfoBits },
    GetDcd { vfo: VfoBits },
    GetStrength { vfo: VfoBits },

    SetChannel { vfo: VfoBits, channel: Box<Channel> },
    GetChannel { vfo: VfoBits, number: i32, read_only: bool },
    SetMem { vfo: VfoBits, number: i32 },

    SetRit { vfo: VfoBits, offset: i32 },
    GetRit { vfo: VfoBits },
    SetXit { vfo: VfoBits, offset: i32 },
    GetXit { vfo: VfoBits },
    ClearRitXit { vfo: VfoBits },

    Scan { vfo: VfoBits, scan: ScanBits, channel: i32 },

    SetLevel { vfo: VfoBits, level: LevelBits, value: LevelValue },
    GetLevel { vfo: VfoBits, level: LevelBits },
    SetFunc { vfo: VfoBits, func: FuncBits, on: bool },
    GetFunc { vfo: VfoBits, func: FuncBits },

    SetSplitFreq { vfo: VfoBits, freq: f64 },
    GetSplitFreq { vfo: VfoBits },
    SetSplitMode { vfo: VfoBits, mode: ModeBits, width: i64 },
    GetSplitMode { vfo: VfoBits },
    SetSplitVfo { vfo: VfoBits, split: bool, tx_vfo: VfoBits },
    GetSplitVfo { vfo: VfoBits },

    VfoOp { vfo: VfoBits, op: VfoOpBits },
    SetAnt { vfo: VfoBits, ant: u32 },
    GetAnt { vfo: VfoBits },
    SetPowerstat { status: u32 },
    GetPowerstat,
    SetRptrShift { vfo: VfoBits, shift: u32 },
    GetRptrShift { vfo: VfoBits },
    SetRptrOffs { vfo: VfoBits, offset: i32 },
    GetRptrOffs { vfo: VfoBits },
    SetCtcssTone { vfo: VfoBits, tone: u32 },
    GetCtcssTone { vfo: VfoBits },
    SetDcsCode { vfo: VfoBits, code: u32 },
    GetDcsCode { vfo: VfoBits },
    SetSerialConfig { param: SerialParam, value: u32 },
    GetSerialConfig { param: SerialParam },
    SetPttType { ptt_type: u32 },
    GetPttType,
    SetDcdType { dcd_type: u32 },
    GetDcdType,
}

impl Operation {
    /// Short name for diagnostics.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Operation::SetFreq { .. } => "set_freq",
            Operation::GetFreq { .. } => "get_freq",
            Operation::SetMode { .. } => "set_mode",
            Operation::GetMode { .. } => "get_mode",
            Operation::SetVfo { .. } => "set_vfo",
            Operation::GetVfo => "get_vfo",
            Operation::SetPtt { .. } => "set_ptt",
            Operation::GetPtt { .. } => "get_ptt",
            Operation::GetDcd { .. } => "get_dcd",
            Operation::GetStrength { .. } => "get_strength",
            Operation::SetChannel { .. } => "set_channel",
            Operation::GetChannel { .. } => "get_channel",
            Operation::SetMem { .. } => "set_mem",
            Operation::SetRit { .. } => "set_rit",
            Operation::GetRit { .. } => "get_rit",
            Operation::SetXit { .. } => "set_xit",
            Operation::GetXit { .. } => "get_xit",
            Operation::ClearRitXit { .. } => "clear_rit_xit",
            Operation::Scan { .. } => "scan",
            Operation::SetLevel { .. } => "set_level",
            Operation::GetLevel { .. } => "get_level",
            Operation::SetFunc { .. } => "set_func",
            Operation::GetFunc { .. } => "get_func",
            Operation::SetSplitFreq { .. } => "set_split_freq",
            Operation::GetSplitFreq { .. } => "get_split_freq",
            Operation::SetSplitMode { .. } => "set_split_mode",
            Operation::GetSplitMode { .. } => "get_split_mode",
            Operation::SetSplitVfo { .. } => "set_split_vfo",
            Operation::GetSplitVfo { .. } => "get_split_vfo",
            Operation::VfoOp { .. } => "vfo_op",
            Operation::SetAnt { .. } => "set_ant",
            Operation::GetAnt { .. } => "get_ant",
            Operation::SetPowerstat { .. } => "set_powerstat",
            Operation::GetPowerstat => "get_powerstat",
            Operation::SetRptrShift { .. } => "set_rptr_shift",
            Operation::GetRptrShift { .. } => "get_rptr_shift",
            Operation::SetRptrOffs { .. } => "set_rptr_offs",
            Operation::GetRptrOffs { .. } => "get_rptr_offs",
            Operation::SetCtcssTone { .. } => "set_ctcss_tone",
            Operation::GetCtcssTone { .. } => "get_ctcss_tone",
            Operation::SetDcsCode { .. } => "set_dcs_code",
            Operation::GetDcsCode { .. } => "get_dcs_code",
            Operation::SetSerialConfig { .. } => "set_serial_config",
            Operation::GetSerialConfig { .. } => "get_serial_config",
            Operation::SetPttType { .. } => "set_ptt_type",
            Operation::GetPttType => "get_ptt_type",
            Operation::SetDcdType { .. } => "set_dcd_type",
            Operation::GetDcdType => "get_dcd_type",
        }
    }

    /// Run this operation against `driver`. Blocks for the duration of the
    /// driver call.
    pub(crate) fn execute(self, driver: &mut dyn RigDriver) -> DriverResult<Reply> {
        use Operation as Op;

        Ok(match self {
            Op::SetFreq { vfo, freq } => {
                driver.set_freq(vfo, freq)?;
                Reply::Unit
            }
            Op::GetFreq { vfo } => Reply::Freq(driver.get_freq(vfo)?),
            Op::SetMode { vfo, mode, width } => {
                driver.set_mode(vfo, mode, width)?;
                Reply::Unit
            }
            Op::GetMode { vfo } => {
                let (mode, width) = driver.get_mode(vfo)?;
                Reply::Mode(mode, width)
            }
            Op::SetVfo { vfo } => {
                driver.set_vfo(vfo)?;
                Reply::Unit
            }
            Op::GetVfo => Reply::U32(driver.get_vfo()?),

            Op::SetPtt { vfo, ptt } => {
                driver.set_ptt(vfo, ptt)?;
                Reply::Unit
            }
            Op::GetPtt { vfo } => Reply::U32(driver.get_ptt(vfo)?),
            Op::GetDcd { vfo } => Reply::U32(driver.get_dcd(vfo)?),
            Op::GetStrength { vfo } => Reply::I32(driver.get_strength(vfo)?),

            Op::SetChannel { vfo, channel } => {
                driver.set_channel(vfo, &channel)?;
                Reply::Unit
            }
            Op::GetChannel {
                vfo,
                number,
                read_only,
            } => Reply::Channel(Box::new(driver.get_channel(vfo, number, read_only)?)),
            Op::SetMem { vfo, number } => {
                driver.set_mem(vfo, number)?;
                Reply::Unit
            }

            Op::SetRit { vfo, offset } => {
                driver.set_rit(vfo, offset)?;
                Reply::Unit
            }
            Op::GetRit { vfo } => Reply::I32(driver.get_rit(vfo)?),
            Op::SetXit { vfo, offset } => {
                driver.set_xit(vfo, offset)?;
                Reply::Unit
            }
            Op::GetXit { vfo } => Reply::I32(driver.get_xit(vfo)?),
            Op::ClearRitXit { vfo } => {
                driver.set_rit(vfo, 0)?;
                driver.set_xit(vfo, 0)?;
                Reply::Unit
            }

            Op::Scan { vfo, scan, channel } => {
                driver.scan(vfo, scan, channel)?;
                Reply::Unit
            }

            Op::SetLevel { vfo, level, value } => {
                driver.set_level(vfo, level, value)?;
                Reply::Unit
            }
            Op::GetLevel { vfo, level } => Reply::Level(driver.get_level(vfo, level)?),
            Op::SetFunc { vfo, func, on } => {
                driver.set_func(vfo, func, on)?;
                Reply::Unit
            }
            Op::GetFunc { vfo, func } => Reply::Bool(driver.get_func(vfo, func)?),

            Op::SetSplitFreq { vfo, freq } => {
                driver.set_split_freq(vfo, freq)?;
                Reply::Unit
            }
            Op::GetSplitFreq { vfo } => Reply::Freq(driver.get_split_freq(vfo)?),
            Op::SetSplitMode { vfo, mode, width } => {
                driver.set_split_mode(vfo, mode, width)?;
                Reply::Unit
            }
            Op::GetSplitMode { vfo } => {
                let (mode, width) = driver.get_split_mode(vfo)?;
                Reply::Mode(mode, width)
            }
            Op::SetSplitVfo { vfo, split, tx_vfo } => {
                driver.set_split_vfo(vfo, split, tx_vfo)?;
                Reply::Unit
            }
            Op::GetSplitVfo { vfo } => {
                let (split, tx_vfo) = driver.get_split_vfo(vfo)?;
                Reply::Split(split, tx_vfo)
            }

            Op::VfoOp { vfo, op } => {
                driver.vfo_op(vfo, op)?;
                Reply::Unit
            }
            Op::SetAnt { vfo, ant } => {
                driver.set_ant(vfo, ant)?;
                Reply::Unit
            }
            Op::GetAnt { vfo } => Reply::U32(driver.get_ant(vfo)?),
            Op::SetPowerstat { status } => {
                driver.set_powerstat(status)?;
                Reply::Unit
            }
            Op::GetPowerstat => Reply::U32(driver.get_powerstat()?),
            Op::SetRptrShift { vfo, shift } => {
                driver.set_rptr_shift(vfo, shift)?;
                Reply::Unit
            }
            Op::GetRptrShift { vfo } => Reply::U32(driver.get_rptr_shift(vfo)?),
            Op::SetRptrOffs { vfo, offset } => {
                driver.set_rptr_offs(vfo, offset)?;
                Reply::Unit
            }
            Op::GetRptrOffs { vfo } => Reply::I32(driver.get_rptr_offs(vfo)?),
            Op::SetCtcssTone { vfo, tone } => {
                driver.set_ctcss_tone(vfo, tone)?;
                Reply::Unit
            }
            Op::GetCtcssTone { vfo } => Reply::U32(driver.get_ctcss_tone(vfo)?),
            Op::SetDcsCode { vfo, code } => {
                driver.set_dcs_code(vfo, code)?;
                Reply::Unit
            }
            Op::GetDcsCode { vfo } => Reply::U32(driver.get_dcs_code(vfo)?),
            Op::SetSerialConfig { param, value } => {
                driver.set_serial_config(param, value)?;
                Reply::Unit
            }
            Op::GetSerialConfig { param } => Reply::U32(driver.get_serial_config(param)?),
            Op::SetPttType { ptt_type } => {
                driver.set_ptt_type(ptt_type)?;
                Reply::Unit
            }
            Op::GetPttType => Reply::U32(driver.get_ptt_type()?),
            Op::SetDcdType { dcd_type } => {
                driver.set_dcd_type(dcd_type)?;
                Reply::Unit
            }
            Op::GetDcdType => Reply::U32(driver.get_dcd_type()?),
        })
    }
}

/// Native result of one executed operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reply {
    Unit,
    Freq(f64),
    Mode(ModeBits, i64),
    U32(u32),
    I32(i32),
    Bool(bool),
    Level(LevelValue),
    Channel(Box<Channel>),
    Split(bool, VfoBits),
}

fn mismatched(reply: &Reply) -> Error {
    Error::driver(
        Status::EINTERNAL,
        format!("unexpected driver reply {reply:?}"),
    )
}

impl Reply {
    pub(crate) fn into_unit(self) -> Result<()> {
        match self {
            Reply::Unit => Ok(()),
            other => Err(mismatched(&other)),
        }
    }

    pub(crate) fn into_freq(self) -> Result<f64> {
        match self {
            Reply::Freq(f) => Ok(f),
            other => Err(mismatched(&other)),
        }
    }

    pub(crate) fn into_mode(self) -> Result<(ModeBits, i64)> {
        match self {
            Reply::Mode(mode, width) => Ok((mode, width)),
            other => Err(mismatched(&other)),
        }
    }

    pub(crate) fn into_u32(self) -> Result<u32> {
        match self {
            Reply::U32(v) => Ok(v),
            other => Err(mismatched(&other)),
        }
    }

    pub(crate) fn into_i32(self) -> Result<i32> {
        match self {
            Reply::I32(v) => Ok(v),
            other => Err(mismatched(&other)),
        }
    }

    pub(crate) fn into_bool(self) -> Result<bool> {
        match self {
            Reply::Bool(v) => Ok(v),
            other => Err(mismatched(&other)),
        }
    }

    pub(crate) fn into_level(self) -> Result<LevelValue> {
        match self {
            Reply::Level(v) => Ok(v),
            other => Err(mismatched(&other)),
        }
    }

    pub(crate) fn into_channel(self) -> Result<Channel> {
        match self {
            Reply::Channel(c) => Ok(*c),
            other => Err(mismatched(&other)),
        }
    }

    pub(crate) fn into_split(self) -> Result<(bool, VfoBits)> {
        match self {
            Reply::Split(split, tx_vfo) => Ok((split, tx_vfo)),
            other => Err(mismatched(&other)),
        }
    }
}

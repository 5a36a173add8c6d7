//! Capability records for the simulated models.
//!
//! Each simulated rig is described by a [`RigCaps`] built by a factory
//! function (e.g. [`ic_7300()`]). The records deliberately differ in modes,
//! levels, memory layout and tone tables so tests can check that the bridge
//! validates against the model actually in use.
//!
//! | Model     | Id   | Modes            | Channels        | Antennas |
//! |-----------|------|------------------|-----------------|----------|
//! | Dummy     | 1    | everything       | 0-199           | 4        |
//! | NET rigctl| 2    | everything       | 0-199           | 4        |
//! | IC-7300   | 3073 | HF + data        | 1-99, 100-101   | 1        |
//! | FT-991    | 1035 | HF/VHF + FMN     | 1-117           | 1        |
//! | TS-890S   | 2041 | HF + data        | 0-119           | 2        |
//! | K3        | 2029 | HF, no DCS       | 0-99            | 2        |

use rigbridge_core::native::*;
use rigbridge_core::types::{DeviceCategory, ModelId, ModelStatus};
use rigbridge_core::{ChannelRange, FilterSpec, Granularity, RigCaps};

pub const MODEL_IC7300: ModelId = 3073;
pub const MODEL_FT991: ModelId = 1035;
pub const MODEL_TS890S: ModelId = 2041;
pub const MODEL_K3: ModelId = 2029;

// ---------------------------------------------------------------------------
// Shared tables
// ---------------------------------------------------------------------------

/// Standard EIA CTCSS tones in tenths of hertz.
pub const CTCSS_TONES: [u32; 50] = [
    670, 693, 719, 744, 770, 797, 825, 854, 885, 915, 948, 974, 1000, 1035, 1072, 1109, 1148,
    1188, 1230, 1273, 1318, 1365, 1413, 1462, 1514, 1567, 1598, 1622, 1655, 1679, 1713, 1738,
    1773, 1799, 1835, 1862, 1899, 1928, 1966, 1995, 2035, 2065, 2107, 2181, 2257, 2291, 2336,
    2418, 2503, 2541,
];

/// Standard DCS codes.
pub const DCS_CODES: [u32; 104] = [
    23, 25, 26, 31, 32, 36, 43, 47, 51, 53, 54, 65, 71, 72, 73, 74, 114, 115, 116, 122, 125, 131,
    132, 134, 143, 145, 152, 155, 156, 162, 165, 172, 174, 205, 212, 223, 225, 226, 243, 244, 245,
    246, 251, 252, 255, 261, 263, 265, 266, 271, 274, 306, 311, 315, 325, 331, 332, 343, 346, 351,
    356, 364, 365, 371, 411, 412, 413, 423, 431, 432, 445, 446, 452, 454, 455, 462, 464, 465, 466,
    503, 506, 516, 523, 526, 532, 546, 565, 606, 612, 624, 627, 631, 632, 654, 662, 664, 703, 712,
    723, 731, 732, 734, 743, 754,
];

const HF_MODES: ModeBits = MODE_LSB
    | MODE_USB
    | MODE_CW
    | MODE_CWR
    | MODE_RTTY
    | MODE_RTTYR
    | MODE_AM
    | MODE_FM
    | MODE_PKTLSB
    | MODE_PKTUSB;

const METERS: LevelBits = LEVEL_STRENGTH | LEVEL_RAWSTR | LEVEL_SWR | LEVEL_ALC;

/// Filter table used by most transceivers: SSB, CW, AM, FM.
fn standard_filters() -> Vec<FilterSpec> {
    vec![
        FilterSpec {
            modes: MODE_LSB | MODE_USB | MODE_PKTLSB | MODE_PKTUSB,
            normal: 2_400,
            narrow: 1_800,
            wide: 3_000,
        },
        FilterSpec {
            modes: MODE_CW | MODE_CWR | MODE_RTTY | MODE_RTTYR,
            normal: 500,
            narrow: 250,
            wide: 1_200,
        },
        FilterSpec {
            modes: MODE_AM | MODE_PKTAM,
            normal: 6_000,
            narrow: 3_000,
            wide: 9_000,
        },
        FilterSpec {
            modes: MODE_FM | MODE_PKTFM,
            normal: 15_000,
            narrow: 10_000,
            wide: 20_000,
        },
        FilterSpec {
            modes: MODE_FMN,
            normal: 12_500,
            narrow: 9_000,
            wide: 12_500,
        },
    ]
}

// ---------------------------------------------------------------------------
// Model definitions
// ---------------------------------------------------------------------------

/// The built-in dummy rig: publishes nearly everything.
pub fn dummy() -> RigCaps {
    RigCaps {
        model_id: MODEL_DUMMY,
        model_name: "Dummy",
        manufacturer: "Hamlib",
        version: "20240709.0",
        status: ModelStatus::Stable,
        category: DeviceCategory::Other,
        modes: HF_MODES | MODE_WFM | MODE_PKTFM | MODE_PKTAM | MODE_SAM | MODE_FMN,
        vfos: VFO_A | VFO_B | VFO_C | VFO_MAIN | VFO_SUB | VFO_MEM,
        has_get_level: LEVEL_PREAMP
            | LEVEL_ATT
            | LEVEL_AF
            | LEVEL_RF
            | LEVEL_SQL
            | LEVEL_NR
            | LEVEL_CWPITCH
            | LEVEL_RFPOWER
            | LEVEL_MICGAIN
            | LEVEL_KEYSPD
            | LEVEL_COMP
            | LEVEL_AGC
            | LEVEL_VOXGAIN
            | METERS,
        has_set_level: LEVEL_PREAMP
            | LEVEL_ATT
            | LEVEL_AF
            | LEVEL_RF
            | LEVEL_SQL
            | LEVEL_NR
            | LEVEL_CWPITCH
            | LEVEL_RFPOWER
            | LEVEL_MICGAIN
            | LEVEL_KEYSPD
            | LEVEL_COMP
            | LEVEL_AGC
            | LEVEL_VOXGAIN,
        level_granularity: vec![
            (LEVEL_PREAMP, Granularity::new(0.0, 20.0, 10.0)),
            (LEVEL_ATT, Granularity::new(0.0, 20.0, 10.0)),
            (LEVEL_CWPITCH, Granularity::new(300.0, 1_200.0, 10.0)),
            (LEVEL_KEYSPD, Granularity::new(5.0, 50.0, 1.0)),
            (LEVEL_AGC, Granularity::new(0.0, 6.0, 1.0)),
            (LEVEL_STRENGTH, Granularity::new(-54.0, 60.0, 1.0)),
        ],
        has_get_func: FUNC_FAGC
            | FUNC_NB
            | FUNC_COMP
            | FUNC_VOX
            | FUNC_TONE
            | FUNC_TSQL
            | FUNC_ANF
            | FUNC_NR
            | FUNC_MON
            | FUNC_LOCK
            | FUNC_MUTE
            | FUNC_RIT
            | FUNC_XIT
            | FUNC_TUNER,
        has_set_func: FUNC_FAGC
            | FUNC_NB
            | FUNC_COMP
            | FUNC_VOX
            | FUNC_TONE
            | FUNC_TSQL
            | FUNC_ANF
            | FUNC_NR
            | FUNC_MON
            | FUNC_LOCK
            | FUNC_MUTE
            | FUNC_RIT
            | FUNC_XIT
            | FUNC_TUNER,
        scan_ops: SCAN_MEM | SCAN_SLCT | SCAN_PRIO | SCAN_PROG | SCAN_DELTA | SCAN_VFO,
        vfo_ops: OP_CPY
            | OP_XCHG
            | OP_FROM_VFO
            | OP_TO_VFO
            | OP_MCL
            | OP_UP
            | OP_DOWN
            | OP_BAND_UP
            | OP_BAND_DOWN
            | OP_TUNE
            | OP_TOGGLE,
        max_rit: 9_990,
        max_xit: 9_990,
        antennas: 4,
        ctcss_tones: CTCSS_TONES.to_vec(),
        dcs_codes: DCS_CODES.to_vec(),
        channels: vec![ChannelRange::new(0, 199)],
        filters: standard_filters(),
    }
}

/// Generic network-control model, used for `host:port` endpoints.
///
/// Mirrors the dummy rig's capabilities; the remote end has no
/// transceive support, so it never registers callbacks.
pub fn netrigctl() -> RigCaps {
    RigCaps {
        model_id: MODEL_NETRIGCTL,
        model_name: "NET rigctl",
        version: "20240110.0",
        category: DeviceCategory::Other,
        ..dummy()
    }
}

/// Icom IC-7300.
pub fn ic_7300() -> RigCaps {
    RigCaps {
        model_id: MODEL_IC7300,
        model_name: "IC-7300",
        manufacturer: "Icom",
        version: "20231218.0",
        status: ModelStatus::Stable,
        category: DeviceCategory::Transceiver,
        modes: HF_MODES | MODE_PKTFM | MODE_PKTAM,
        vfos: VFO_A | VFO_B | VFO_MEM,
        has_get_level: LEVEL_PREAMP
            | LEVEL_ATT
            | LEVEL_AF
            | LEVEL_RF
            | LEVEL_SQL
            | LEVEL_NR
            | LEVEL_PBT_IN
            | LEVEL_PBT_OUT
            | LEVEL_CWPITCH
            | LEVEL_RFPOWER
            | LEVEL_MICGAIN
            | LEVEL_KEYSPD
            | LEVEL_NOTCHF
            | LEVEL_COMP
            | LEVEL_AGC
            | LEVEL_BKINDL
            | LEVEL_VOXGAIN
            | LEVEL_ANTIVOX
            | METERS,
        has_set_level: LEVEL_PREAMP
            | LEVEL_ATT
            | LEVEL_AF
            | LEVEL_RF
            | LEVEL_SQL
            | LEVEL_NR
            | LEVEL_PBT_IN
            | LEVEL_PBT_OUT
            | LEVEL_CWPITCH
            | LEVEL_RFPOWER
            | LEVEL_MICGAIN
            | LEVEL_KEYSPD
            | LEVEL_NOTCHF
            | LEVEL_COMP
            | LEVEL_AGC
            | LEVEL_BKINDL
            | LEVEL_VOXGAIN
            | LEVEL_ANTIVOX,
        level_granularity: vec![
            (LEVEL_PREAMP, Granularity::new(0.0, 2.0, 1.0)),
            (LEVEL_ATT, Granularity::new(0.0, 20.0, 20.0)),
            (LEVEL_CWPITCH, Granularity::new(300.0, 900.0, 5.0)),
            (LEVEL_KEYSPD, Granularity::new(6.0, 48.0, 1.0)),
            (LEVEL_NOTCHF, Granularity::new(0.0, 255.0, 1.0)),
            (LEVEL_AGC, Granularity::new(0.0, 3.0, 1.0)),
            (LEVEL_BKINDL, Granularity::new(2.0, 13.0, 1.0)),
            (LEVEL_RFPOWER, Granularity::new(0.0, 1.0, 1.0 / 255.0)),
            (LEVEL_STRENGTH, Granularity::new(-54.0, 60.0, 1.0)),
        ],
        has_get_func: FUNC_NB
            | FUNC_COMP
            | FUNC_VOX
            | FUNC_TONE
            | FUNC_TSQL
            | FUNC_SBKIN
            | FUNC_FBKIN
            | FUNC_ANF
            | FUNC_NR
            | FUNC_MON
            | FUNC_MN
            | FUNC_LOCK
            | FUNC_RIT
            | FUNC_XIT
            | FUNC_TUNER
            | FUNC_SCOPE,
        has_set_func: FUNC_NB
            | FUNC_COMP
            | FUNC_VOX
            | FUNC_TONE
            | FUNC_TSQL
            | FUNC_SBKIN
            | FUNC_FBKIN
            | FUNC_ANF
            | FUNC_NR
            | FUNC_MON
            | FUNC_MN
            | FUNC_LOCK
            | FUNC_RIT
            | FUNC_XIT
            | FUNC_TUNER,
        scan_ops: SCAN_MEM | SCAN_SLCT | SCAN_PROG | SCAN_DELTA | SCAN_VFO,
        vfo_ops: OP_CPY | OP_XCHG | OP_FROM_VFO | OP_TO_VFO | OP_MCL | OP_TUNE,
        max_rit: 9_999,
        max_xit: 9_999,
        antennas: 1,
        ctcss_tones: CTCSS_TONES.to_vec(),
        dcs_codes: Vec::new(),
        channels: vec![ChannelRange::new(1, 99), ChannelRange::new(100, 101)],
        filters: standard_filters(),
    }
}

/// Yaesu FT-991.
pub fn ft_991() -> RigCaps {
    RigCaps {
        model_id: MODEL_FT991,
        model_name: "FT-991",
        manufacturer: "Yaesu",
        version: "20231104.0",
        status: ModelStatus::Stable,
        category: DeviceCategory::Transceiver,
        modes: HF_MODES | MODE_FMN | MODE_PKTFM,
        vfos: VFO_A | VFO_B | VFO_MEM,
        has_get_level: LEVEL_PREAMP
            | LEVEL_ATT
            | LEVEL_AF
            | LEVEL_RF
            | LEVEL_SQL
            | LEVEL_CWPITCH
            | LEVEL_RFPOWER
            | LEVEL_MICGAIN
            | LEVEL_KEYSPD
            | LEVEL_COMP
            | LEVEL_VOXGAIN
            | METERS,
        has_set_level: LEVEL_PREAMP
            | LEVEL_ATT
            | LEVEL_AF
            | LEVEL_RF
            | LEVEL_SQL
            | LEVEL_CWPITCH
            | LEVEL_RFPOWER
            | LEVEL_MICGAIN
            | LEVEL_KEYSPD
            | LEVEL_COMP
            | LEVEL_VOXGAIN,
        level_granularity: vec![
            (LEVEL_PREAMP, Granularity::new(0.0, 20.0, 10.0)),
            (LEVEL_ATT, Granularity::new(0.0, 12.0, 12.0)),
            (LEVEL_CWPITCH, Granularity::new(300.0, 1_050.0, 50.0)),
            (LEVEL_KEYSPD, Granularity::new(4.0, 60.0, 1.0)),
            (LEVEL_RFPOWER, Granularity::new(0.05, 1.0, 0.01)),
            (LEVEL_STRENGTH, Granularity::new(-54.0, 60.0, 1.0)),
        ],
        has_get_func: FUNC_NB | FUNC_COMP | FUNC_VOX | FUNC_TONE | FUNC_TSQL | FUNC_LOCK | FUNC_MON,
        has_set_func: FUNC_NB | FUNC_COMP | FUNC_VOX | FUNC_TONE | FUNC_TSQL | FUNC_LOCK | FUNC_MON,
        scan_ops: SCAN_VFO,
        vfo_ops: OP_CPY | OP_XCHG | OP_FROM_VFO | OP_TO_VFO | OP_UP | OP_DOWN | OP_TOGGLE,
        max_rit: 9_999,
        max_xit: 9_999,
        antennas: 1,
        ctcss_tones: CTCSS_TONES.to_vec(),
        dcs_codes: DCS_CODES.to_vec(),
        channels: vec![ChannelRange::new(1, 117)],
        filters: standard_filters(),
    }
}

/// Kenwood TS-890S.
pub fn ts_890s() -> RigCaps {
    RigCaps {
        model_id: MODEL_TS890S,
        model_name: "TS-890S",
        manufacturer: "Kenwood",
        version: "20230905.0",
        status: ModelStatus::Beta,
        category: DeviceCategory::Transceiver,
        modes: HF_MODES | MODE_PKTFM,
        vfos: VFO_A | VFO_B | VFO_MEM,
        has_get_level: LEVEL_PREAMP
            | LEVEL_ATT
            | LEVEL_AF
            | LEVEL_RF
            | LEVEL_SQL
            | LEVEL_CWPITCH
            | LEVEL_RFPOWER
            | LEVEL_KEYSPD
            | LEVEL_AGC
            | METERS,
        has_set_level: LEVEL_PREAMP
            | LEVEL_ATT
            | LEVEL_AF
            | LEVEL_RF
            | LEVEL_SQL
            | LEVEL_CWPITCH
            | LEVEL_RFPOWER
            | LEVEL_KEYSPD
            | LEVEL_AGC,
        level_granularity: vec![
            (LEVEL_PREAMP, Granularity::new(0.0, 2.0, 1.0)),
            (LEVEL_ATT, Granularity::new(0.0, 18.0, 6.0)),
            (LEVEL_CWPITCH, Granularity::new(300.0, 1_100.0, 5.0)),
            (LEVEL_KEYSPD, Granularity::new(4.0, 100.0, 1.0)),
            (LEVEL_AGC, Granularity::new(0.0, 3.0, 1.0)),
            (LEVEL_STRENGTH, Granularity::new(-54.0, 60.0, 1.0)),
        ],
        has_get_func: FUNC_NB | FUNC_COMP | FUNC_VOX | FUNC_ANF | FUNC_NR | FUNC_LOCK | FUNC_TUNER,
        has_set_func: FUNC_NB | FUNC_COMP | FUNC_VOX | FUNC_ANF | FUNC_NR | FUNC_LOCK | FUNC_TUNER,
        scan_ops: SCAN_VFO | SCAN_MEM,
        vfo_ops: OP_UP | OP_DOWN | OP_BAND_UP | OP_BAND_DOWN,
        max_rit: 9_999,
        max_xit: 9_999,
        antennas: 2,
        ctcss_tones: CTCSS_TONES.to_vec(),
        dcs_codes: Vec::new(),
        channels: vec![ChannelRange::new(0, 119)],
        filters: standard_filters(),
    }
}

/// Elecraft K3.
pub fn k3() -> RigCaps {
    RigCaps {
        model_id: MODEL_K3,
        model_name: "K3",
        manufacturer: "Elecraft",
        version: "20231010.0",
        status: ModelStatus::Stable,
        category: DeviceCategory::Transceiver,
        modes: HF_MODES,
        vfos: VFO_A | VFO_B,
        has_get_level: LEVEL_ATT
            | LEVEL_PREAMP
            | LEVEL_AF
            | LEVEL_RF
            | LEVEL_SQL
            | LEVEL_CWPITCH
            | LEVEL_RFPOWER
            | LEVEL_MICGAIN
            | LEVEL_KEYSPD
            | LEVEL_AGC
            | METERS,
        has_set_level: LEVEL_ATT
            | LEVEL_PREAMP
            | LEVEL_AF
            | LEVEL_RF
            | LEVEL_SQL
            | LEVEL_CWPITCH
            | LEVEL_RFPOWER
            | LEVEL_MICGAIN
            | LEVEL_KEYSPD
            | LEVEL_AGC,
        level_granularity: vec![
            (LEVEL_PREAMP, Granularity::new(0.0, 1.0, 1.0)),
            (LEVEL_ATT, Granularity::new(0.0, 10.0, 10.0)),
            (LEVEL_CWPITCH, Granularity::new(400.0, 800.0, 10.0)),
            (LEVEL_KEYSPD, Granularity::new(8.0, 50.0, 1.0)),
            (LEVEL_AGC, Granularity::new(0.0, 2.0, 1.0)),
            (LEVEL_STRENGTH, Granularity::new(-54.0, 60.0, 1.0)),
        ],
        has_get_func: FUNC_NB | FUNC_VOX | FUNC_APF | FUNC_NR | FUNC_LOCK | FUNC_RIT | FUNC_XIT,
        has_set_func: FUNC_NB | FUNC_VOX | FUNC_APF | FUNC_NR | FUNC_LOCK | FUNC_RIT | FUNC_XIT,
        scan_ops: SCAN_VFO,
        vfo_ops: OP_CPY | OP_XCHG | OP_UP | OP_DOWN | OP_BAND_UP | OP_BAND_DOWN,
        max_rit: 9_999,
        max_xit: 9_999,
        antennas: 2,
        ctcss_tones: CTCSS_TONES.to_vec(),
        dcs_codes: Vec::new(),
        channels: vec![ChannelRange::new(0, 99)],
        filters: standard_filters(),
    }
}

/// Every simulated model, in catalog order.
pub fn all_models() -> Vec<RigCaps> {
    vec![dummy(), netrigctl(), ic_7300(), ft_991(), ts_890s(), k3()]
}

/// Capability record for `model`, if it is simulated.
pub fn find_model(model: ModelId) -> Option<RigCaps> {
    all_models().into_iter().find(|caps| caps.model_id == model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_are_unique() {
        let models = all_models();
        for (i, a) in models.iter().enumerate() {
            for b in &models[i + 1..] {
                assert_ne!(a.model_id, b.model_id, "{} / {}", a.model_name, b.model_name);
            }
        }
    }

    #[test]
    fn settable_levels_are_gettable() {
        for caps in all_models() {
            assert_eq!(
                caps.has_set_level & !caps.has_get_level,
                0,
                "{}",
                caps.model_name
            );
            assert_eq!(caps.has_set_level & LEVEL_READONLY_LIST, 0, "{}", caps.model_name);
        }
    }

    #[test]
    fn granularity_ranges_are_ordered() {
        for caps in all_models() {
            for (_, g) in &caps.level_granularity {
                assert!(g.min < g.max, "{}", caps.model_name);
                assert!(g.step >= 0.0);
            }
        }
    }

    #[test]
    fn models_differ_where_tests_rely_on_it() {
        assert_eq!(k3().modes & MODE_PKTFM, 0);
        assert_ne!(ic_7300().modes & MODE_PKTFM, 0);
        assert!(k3().dcs_codes.is_empty());
        assert_eq!(ts_890s().antennas, 2);
        assert!(ic_7300().channels.iter().all(|r| !r.contains(0)));
    }

    #[test]
    fn find_model_by_id() {
        assert_eq!(find_model(MODEL_FT991).map(|c| c.model_name), Some("FT-991"));
        assert!(find_model(9_999).is_none());
    }

    #[test]
    fn ctcss_table_is_sorted() {
        assert!(CTCSS_TONES.windows(2).all(|w| w[0] < w[1]));
        assert!(DCS_CODES.windows(2).all(|w| w[0] < w[1]));
    }
}

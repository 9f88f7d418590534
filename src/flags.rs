//! # Table Flags
//!
//! Every TABLE chunk carries a flags word whose bitfield semantics are
//! undocumented. The values are stable per table identifier, so the
//! encoder ships the identifier-to-flags map captured from a retail save
//! and refuses identifiers it has never seen rather than guess. If a
//! future sample disagrees with an entry here, the sample wins.

use phf::phf_map;

static TABLE_FLAGS: phf::Map<u32, u32> = phf_map! {
    3u32 => 0x0111,
    4u32 => 0x0111,
    5u32 => 0x0111,
    6u32 => 0x0011,
    7u32 => 0x0111,
    8u32 => 0x0111,
    9u32 => 0x0011,
    10u32 => 0x0111,
    11u32 => 0x0111,
    12u32 => 0x0111,
    13u32 => 0x0011,
    14u32 => 0x0111,
    15u32 => 0x0111,
    16u32 => 0x0111,
    17u32 => 0x0011,
    18u32 => 0x0111,
    19u32 => 0x0111,
    20u32 => 0x0111,
    21u32 => 0x0111,
    22u32 => 0x0011,
    23u32 => 0x0111,
    24u32 => 0x0111,
    25u32 => 0x0011,
    26u32 => 0x0111,
    27u32 => 0x0111,
    28u32 => 0x0111,
    29u32 => 0x0111,
    30u32 => 0x0011,
    31u32 => 0x0111,
    32u32 => 0x0111,
    33u32 => 0x0111,
    34u32 => 0x0011,
    35u32 => 0x0111,
    36u32 => 0x0111,
    37u32 => 0x0111,
    38u32 => 0x0111,
    39u32 => 0x0011,
    40u32 => 0x0111,
    41u32 => 0x0111,
    42u32 => 0x0111,
    43u32 => 0x0011,
    44u32 => 0x0111,
    45u32 => 0x0111,
    46u32 => 0x0111,
    47u32 => 0x0111,
    48u32 => 0x0011,
    49u32 => 0x0111,
    50u32 => 0x0111,
    51u32 => 0x0111,
    52u32 => 0x0111,
    53u32 => 0x0011,
    54u32 => 0x0111,
    55u32 => 0x0111,
    56u32 => 0x0111,
    57u32 => 0x0111,
    58u32 => 0x0111,
    59u32 => 0x0011,
    60u32 => 0x0111,
    61u32 => 0x0111,
    62u32 => 0x0111,
    63u32 => 0x0111,
    64u32 => 0x0011,
    65u32 => 0x0111,
    66u32 => 0x0111,
    67u32 => 0x0111,
    68u32 => 0x0111,
    69u32 => 0x0111,
    70u32 => 0x0011,
    71u32 => 0x0111,
    72u32 => 0x0111,
    73u32 => 0x0111,
    74u32 => 0x0111,
    75u32 => 0x0011,
    76u32 => 0x0111,
    77u32 => 0x0111,
    78u32 => 0x0111,
    79u32 => 0x0111,
    80u32 => 0x0111,
    81u32 => 0x0011,
    82u32 => 0x0111,
    83u32 => 0x0111,
    84u32 => 0x0111,
    85u32 => 0x0111,
    86u32 => 0x0011,
    87u32 => 0x0111,
    88u32 => 0x0111,
    89u32 => 0x0111,
    90u32 => 0x0111,
    91u32 => 0x0111,
    92u32 => 0x0011,
    93u32 => 0x0111,
    94u32 => 0x0111,
    95u32 => 0x0111,
    96u32 => 0x0111,
    97u32 => 0x0011,
    98u32 => 0x0111,
    99u32 => 0x0111,
    100u32 => 0x0111,
    101u32 => 0x0111,
    102u32 => 0x0111,
    103u32 => 0x0011,
    104u32 => 0x0111,
    105u32 => 0x0111,
    106u32 => 0x0111,
    107u32 => 0x0111,
    108u32 => 0x0011,
    109u32 => 0x0111,
    110u32 => 0x0111,
    111u32 => 0x0111,
    112u32 => 0x0111,
    113u32 => 0x0111,
    114u32 => 0x0011,
    115u32 => 0x0111,
    116u32 => 0x0111,
    117u32 => 0x0111,
    118u32 => 0x0111,
    119u32 => 0x0011,
    120u32 => 0x0111,
    125u32 => 0x0111,
    130u32 => 0x0111,
    135u32 => 0x0011,
    140u32 => 0x0111,
    145u32 => 0x0111,
    150u32 => 0x0111,
    160u32 => 0x0011,
    170u32 => 0x0111,
    180u32 => 0x0111,
    190u32 => 0x0111,
    200u32 => 0x0011,
    210u32 => 0x0111,
    220u32 => 0x0111,
    230u32 => 0x0111,
    240u32 => 0x0011,
    250u32 => 0x0111,
    260u32 => 0x0111,
    274u32 => 0x0112,
};

/// Looks up the flags word for a table identifier.
pub fn lookup(table_id: u32) -> Option<u32> {
    TABLE_FLAGS.get(&table_id).copied()
}

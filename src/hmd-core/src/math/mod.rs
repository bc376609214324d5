// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod fixed;

pub use fixed::{hex_bytes, read_le_signed, scale_pair, sign_extend};

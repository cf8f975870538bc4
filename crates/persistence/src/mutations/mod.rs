// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Writes, one module per table.
//!
//! Updates are compare-and-swap on the row's `version` column: they touch
//! the row only if the stored version equals the version the caller read,
//! and bump it by one. They return the number of rows written, so a `0`
//! means the row is gone or was changed by someone else.

pub mod audit;
pub mod parties;
pub mod sales;
pub mod test_drives;
pub mod transactions;
pub mod vehicles;

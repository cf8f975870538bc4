// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries, one module per table.
//!
//! Every listing is ordered by primary key.

pub mod audit;
pub mod parties;
pub mod sales;
pub mod test_drives;
pub mod transactions;
pub mod vehicles;

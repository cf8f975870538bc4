// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use std::sync::atomic::{AtomicU32, Ordering};

use showroom::{FixedClock, Showroom};
use showroom_audit::Cause;
use showroom_persistence::Persistence;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{
    AuthenticatedActor, BootstrapAdminRequest, PartyResponse, RegisterPartyRequest, Role,
    VehicleDetailsRequest, bootstrap_admin, register_party,
};

pub const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

static VIN_COUNTER: AtomicU32 = AtomicU32::new(1);

pub type TestShowroom = Showroom<Persistence, FixedClock>;

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

pub fn create_vehicle_request() -> VehicleDetailsRequest {
    let seq: u32 = VIN_COUNTER.fetch_add(1, Ordering::SeqCst);
    VehicleDetailsRequest {
        make: String::from("Honda"),
        model: String::from("Civic"),
        year: 2023,
        vin: format!("2HGFC2F59NH{seq:06}"),
        color: Some(String::from("Blue")),
        license_plate: None,
        price_cents: 2_450_000,
        mileage: 8_000,
        description: None,
    }
}

fn actor(party: &PartyResponse) -> AuthenticatedActor {
    AuthenticatedActor::new(
        showroom_domain::PartyId::new(party.party_id),
        party.role.parse::<Role>().unwrap(),
    )
}

/// A showroom with one authenticated actor of each role.
pub struct ApiFixture {
    pub showroom: TestShowroom,
    pub admin: AuthenticatedActor,
    pub sales: AuthenticatedActor,
    pub cashier: AuthenticatedActor,
    pub customer: AuthenticatedActor,
    pub other_customer: AuthenticatedActor,
}

impl ApiFixture {
    pub fn new() -> Self {
        let showroom = Showroom::new(Persistence::new_in_memory().unwrap(), FixedClock::new(NOW));
        let cause = create_test_cause();
        let admin = actor(
            &bootstrap_admin(
                &showroom,
                &BootstrapAdminRequest {
                    name: String::from("Avery Admin"),
                    email: String::from("admin@showroom.test"),
                },
                &cause,
            )
            .unwrap(),
        );
        let register = |name: &str, email: &str, role: &str| -> AuthenticatedActor {
            actor(
                &register_party(
                    &showroom,
                    RegisterPartyRequest {
                        name: name.to_string(),
                        email: email.to_string(),
                        role: role.to_string(),
                    },
                    &admin,
                    &cause,
                )
                .unwrap(),
            )
        };
        let sales = register("Sam Sales", "sam@showroom.test", "sales");
        let cashier = register("Cass Cashier", "cass@showroom.test", "cashier");
        let customer = register("Casey Customer", "casey@example.com", "customer");
        let other_customer = register("Robin Customer", "robin@example.com", "customer");

        Self {
            showroom,
            admin,
            sales,
            cashier,
            customer,
            other_customer,
        }
    }
}

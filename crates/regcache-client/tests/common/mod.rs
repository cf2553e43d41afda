//! Shared helpers for the cache integration tests.

#![allow(dead_code)]

use regcache_common::InstanceRecord;

mod scripted;

pub use scripted::ScriptedTransport;

pub fn order_instance(n: u16) -> InstanceRecord {
    InstanceRecord::new(
        "ORDER-SERVICE",
        format!("ORDER-SERVICE-{}", n),
        format!("10.0.0.{}", n),
        format!("order-{}", n),
        9000,
    )
}

pub fn finance_instance(n: u16) -> InstanceRecord {
    InstanceRecord::new(
        "FINANCE-SERVICE",
        format!("FINANCE-SERVICE-{}", n),
        format!("10.0.1.{}", n),
        format!("finance-{}", n),
        9100,
    )
}

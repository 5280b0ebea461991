//! Test utilities for building synthetic telemetry and capturing events
//!
//! Shared by unit tests and the benchmarks; enabled with `cfg(test)` or the `benchmark`
//! feature.

#![cfg(any(test, feature = "benchmark"))]

use std::sync::Mutex;

use crate::events::{BridgeEvent, EventSink};
use crate::packet::{PacketVariant, layout};

/// Builds a zeroed Forza packet of a given variant and fills in selected fields.
///
/// Offsets passed to [`PacketBuilder::i32_at`] and [`PacketBuilder::f32_at`] are
/// absolute. The named dash setters apply the variant's dash shift. Writes that fall
/// outside the packet are ignored so sled packets can share builders with dash ones.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    variant: PacketVariant,
    buf: Vec<u8>,
}

impl PacketBuilder {
    pub fn new(variant: PacketVariant) -> Self {
        Self { variant, buf: vec![0; variant.packet_len()] }
    }

    fn write(mut self, offset: usize, bytes: &[u8]) -> Self {
        if let Some(slot) = self.buf.get_mut(offset..offset + bytes.len()) {
            slot.copy_from_slice(bytes);
        }
        self
    }

    fn dash(&self, offset: usize) -> usize {
        offset + self.variant.dash_offset()
    }

    pub fn i32_at(self, offset: usize, value: i32) -> Self {
        self.write(offset, &value.to_le_bytes())
    }

    pub fn f32_at(self, offset: usize, value: f32) -> Self {
        self.write(offset, &value.to_le_bytes())
    }

    pub fn race_on(self, on: bool) -> Self {
        self.i32_at(layout::IS_RACE_ON, i32::from(on))
    }

    pub fn engine(self, max_rpm: f32, idle_rpm: f32, current_rpm: f32) -> Self {
        self.f32_at(layout::ENGINE_MAX_RPM, max_rpm)
            .f32_at(layout::ENGINE_IDLE_RPM, idle_rpm)
            .f32_at(layout::CURRENT_ENGINE_RPM, current_rpm)
    }

    pub fn acceleration(self, x: f32, y: f32, z: f32) -> Self {
        self.f32_at(layout::ACCELERATION, x)
            .f32_at(layout::ACCELERATION + 4, y)
            .f32_at(layout::ACCELERATION + 8, z)
    }

    pub fn combined_slip(self, fl: f32, fr: f32, rl: f32, rr: f32) -> Self {
        self.f32_at(layout::TIRE_COMBINED_SLIP, fl)
            .f32_at(layout::TIRE_COMBINED_SLIP + 4, fr)
            .f32_at(layout::TIRE_COMBINED_SLIP + 8, rl)
            .f32_at(layout::TIRE_COMBINED_SLIP + 12, rr)
    }

    pub fn car(self, class: i32, performance_index: i32) -> Self {
        self.i32_at(layout::CAR_CLASS, class)
            .i32_at(layout::CAR_PERFORMANCE_INDEX, performance_index)
    }

    pub fn power(self, watts: f32) -> Self {
        let offset = self.dash(layout::POWER);
        self.f32_at(offset, watts)
    }

    pub fn inputs(self, accelerator: u8, brake: u8) -> Self {
        let accel = self.dash(layout::ACCELERATOR);
        let brake_at = self.dash(layout::BRAKE);
        self.write(accel, &[accelerator]).write(brake_at, &[brake])
    }

    pub fn lap_number(self, lap: u16) -> Self {
        let offset = self.dash(layout::LAP_NUMBER);
        self.write(offset, &lap.to_le_bytes())
    }

    pub fn steer(self, steer: i8) -> Self {
        let offset = self.dash(layout::STEER);
        self.write(offset, &steer.to_le_bytes())
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// Event sink that keeps every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BridgeEvent>>,
}

impl RecordingSink {
    /// Snapshot of the events reported so far.
    pub fn events(&self) -> Vec<BridgeEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn report(&self, event: BridgeEvent) {
        self.events.lock().unwrap().push(event);
    }
}

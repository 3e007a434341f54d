//! Click-to-select.
//!
//! A click stays pending until one readback cycle has completed: every frame
//! while it is pending resets the GPU pick word and runs the simulation with the
//! click flag set, but only one copy to the staging buffer is ever in flight.
//! Clicks that arrive while a readback is in flight fold into it.

use crate::resources::GpuBuffer;
use std::sync::mpsc;
use swarm_common::EntityId;

/// What a frame does about picking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PickPlan {
    /// Write the sentinel into the pick word before the dispatch.
    pub reset_result: bool,
    /// Value of the uniform click flag.
    pub click_flag: bool,
    /// Copy the pick word to the staging buffer and map it after submission.
    pub schedule_readback: bool,
}

/// Host-side state of the pick protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickProtocol {
    click_pending: bool,
    in_flight: bool,
}

impl PickProtocol {
    pub fn register_click(&mut self) {
        self.click_pending = true;
    }

    pub fn click_pending(&self) -> bool {
        self.click_pending
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Decide this frame's pick work. Marks a readback in flight when one is scheduled.
    pub fn plan_frame(&mut self) -> PickPlan {
        let click = self.click_pending;
        let schedule_readback = click && !self.in_flight;
        if schedule_readback {
            self.in_flight = true;
        }
        PickPlan {
            reset_result: click,
            click_flag: click,
            schedule_readback,
        }
    }

    /// Close the cycle with the word read back, or `None` if the readback failed.
    pub fn complete(&mut self, raw: Option<u32>) -> Option<EntityId> {
        self.in_flight = false;
        self.click_pending = false;
        raw.and_then(EntityId::from_pick)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReadbackError {
    #[error("staging buffer map failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("map callback dropped without a result")]
    Dropped,
}

/// The 4-byte staging buffer the pick word is copied into.
#[derive(Debug)]
pub struct PickReadback {
    staging: wgpu::Buffer,
    receiver: Option<mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>>,
}

impl PickReadback {
    pub const SIZE: u64 = 4;

    pub fn new(device: &wgpu::Device) -> Self {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pick_staging"),
            size: Self::SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            staging,
            receiver: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn record_copy(&self, encoder: &mut wgpu::CommandEncoder, pick: &GpuBuffer) {
        encoder.copy_buffer_to_buffer(pick.buffer(), 0, &self.staging, 0, Self::SIZE);
    }

    /// Request the mapping. Call after the submission that contains the copy.
    pub fn begin_map(&mut self) {
        let (tx, rx) = mpsc::channel();
        self.staging
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        self.receiver = Some(rx);
    }

    /// Non-blocking. `None` while the mapping is still outstanding or none was requested.
    /// Callbacks only fire inside `Device::poll`.
    pub fn try_finish(&mut self) -> Option<Result<u32, ReadbackError>> {
        let outcome = match self.receiver.as_ref()?.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.receiver = None;
                return Some(Err(ReadbackError::Dropped));
            }
        };
        self.receiver = None;
        if let Err(e) = outcome {
            return Some(Err(e.into()));
        }
        let word = {
            let data = self.staging.slice(..).get_mapped_range();
            bytemuck::pod_read_unaligned::<u32>(&data[..4])
        };
        self.staging.unmap();
        Some(Ok(word))
    }

    pub fn destroy(&self) {
        self.staging.destroy();
    }
}

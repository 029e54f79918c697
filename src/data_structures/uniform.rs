//! CPU staging for the shared uniform buffers.
//!
//! A [`UniformWriter`] is reset at the start of every frame, filled with
//! std140-style aligned values and flushed to the GPU buffer with a single
//! `queue.write_buffer`. Offsets handed out by the writer are only valid until
//! the next reset.

use cgmath::Vector3;

/// Largest number of lights the global block carries.
pub const MAX_LIGHTS: usize = 16;
/// Byte size of one packed light (type, colour, direction, position).
pub const LIGHT_STRIDE: u32 = 64;
/// Camera position, light count and far plane, padded to the light array.
pub const GLOBAL_HEADER_SIZE: u32 = 32;
/// Byte size of the global block with every light slot present.
pub const GLOBAL_PARAMS_SIZE: u32 = GLOBAL_HEADER_SIZE + LIGHT_STRIDE * MAX_LIGHTS as u32;
/// Byte size of one entity block (model, view, projection).
pub const LOCAL_PARAMS_SIZE: u32 = 3 * 64;

const VEC4_ALIGNMENT: u32 = 16;

/// Round `value` up to the next multiple of `alignment` (a power of two).
pub const fn align_to(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) & !(alignment - 1)
}

/// A slice of the uniform buffer written this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformRange {
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug)]
pub struct UniformWriter {
    data: Vec<u8>,
    capacity: u32,
}

impl UniformWriter {
    pub fn new(capacity: u32) -> Self {
        Self {
            data: Vec::with_capacity(capacity as usize),
            capacity,
        }
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    pub fn head(&self) -> u32 {
        self.data.len() as u32
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Whether `size` bytes starting at the next `alignment` boundary still fit.
    pub fn fits(&self, size: u32, alignment: u32) -> bool {
        align_to(self.head(), alignment) as u64 + size as u64 <= self.capacity as u64
    }

    /// Pad with zeroes up to the next multiple of `alignment`.
    pub fn align_head(&mut self, alignment: u32) {
        let aligned = align_to(self.head(), alignment).min(self.capacity);
        self.data.resize(aligned as usize, 0);
    }

    /// Zero-fill up to `size` bytes. Does nothing when the head is already past it.
    pub fn pad_to(&mut self, size: u32) {
        if size > self.head() {
            self.data.resize(size.min(self.capacity) as usize, 0);
        }
    }

    /// Append raw bytes at the next `alignment` boundary and return their offset.
    ///
    /// Returns `None` and leaves the writer untouched when the bytes do not fit.
    pub fn push_bytes(&mut self, bytes: &[u8], alignment: u32) -> Option<u32> {
        if !self.fits(bytes.len() as u32, alignment) {
            return None;
        }
        self.align_head(alignment);
        let offset = self.head();
        self.data.extend_from_slice(bytes);
        Some(offset)
    }

    pub fn push_pod<T: bytemuck::Pod>(&mut self, value: &T, alignment: u32) -> Option<u32> {
        self.push_bytes(bytemuck::bytes_of(value), alignment)
    }

    pub fn push_u32(&mut self, value: u32) -> Option<u32> {
        self.push_bytes(&value.to_ne_bytes(), 4)
    }

    pub fn push_f32(&mut self, value: f32) -> Option<u32> {
        self.push_bytes(&value.to_ne_bytes(), 4)
    }

    /// A vec3 starts on a vec4 boundary but only occupies 12 bytes.
    pub fn push_vec3(&mut self, value: Vector3<f32>) -> Option<u32> {
        let raw: [f32; 3] = value.into();
        self.push_bytes(bytemuck::cast_slice(&raw), VEC4_ALIGNMENT)
    }

    /// Everything written so far, padded to a multiple of four bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Upload everything written so far to the start of `buffer`.
    pub fn flush(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        if self.data.is_empty() {
            return;
        }
        let padded = align_to(self.head(), wgpu::COPY_BUFFER_ALIGNMENT as u32) as usize;
        if padded == self.data.len() {
            queue.write_buffer(buffer, 0, &self.data);
        } else {
            let mut bytes = self.data.clone();
            bytes.resize(padded, 0);
            queue.write_buffer(buffer, 0, &bytes);
        }
    }
}

/// Uniform buffer big enough for `capacity` bytes, bindable with dynamic offsets.
pub fn mk_uniform_buffer(device: &wgpu::Device, capacity: u32, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: capacity as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

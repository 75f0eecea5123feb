use std::marker::PhantomData;
use std::{any, mem};

use bytemuck::Pod;
use log::debug;

use crate::buffers::pad_size;
use crate::Bindable;

/// Read-only (from the shaders' point of view) array of items uploaded from
/// the host, e.g. the scene's triangles.
#[derive(Debug)]
pub struct StorageBuffer<T> {
    buffer: wgpu::Buffer,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T> StorageBuffer<T>
where
    T: Pod,
{
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        items: &[T],
    ) -> Self {
        Self::new_with_usage(device, label, items, wgpu::BufferUsages::empty())
    }

    pub fn new_with_usage(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        items: &[T],
        usage: wgpu::BufferUsages,
    ) -> Self {
        let label = format!("penumbra_{}", label.as_ref());
        let bytes: &[u8] = bytemuck::cast_slice(items);
        let size = pad_size(bytes.len());

        debug!(
            "Allocating storage buffer `{label}`; ty={}, len={}, size={size}",
            any::type_name::<T>(),
            items.len(),
        );

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label),
            usage: wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::STORAGE
                | usage,
            size: size as _,
            mapped_at_creation: true,
        });

        buffer.slice(..).get_mapped_range_mut()[..bytes.len()]
            .copy_from_slice(bytes);

        buffer.unmap();

        Self {
            buffer,
            len: items.len(),
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Returns the range of given items, e.g. to use this buffer as a
    /// vertex buffer.
    pub fn slice(&self, items: std::ops::Range<u32>) -> wgpu::BufferSlice {
        let size = mem::size_of::<T>() as u64;

        self.buffer
            .slice((items.start as u64 * size)..(items.end as u64 * size))
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        StorageBufferBinder {
            buffer: &self.buffer,
        }
    }
}

/// Storage buffer that's written and read only by the shaders, e.g. a list
/// of tiles to process by an indirect dispatch.
#[derive(Debug)]
pub struct UnmappedStorageBuffer {
    buffer: wgpu::Buffer,
}

impl UnmappedStorageBuffer {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let label = format!("penumbra_{}", label.as_ref());
        let size = pad_size(size);

        debug!("Allocating unmapped storage buffer `{label}`; size={size}");

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label),
            usage: wgpu::BufferUsages::STORAGE | usage,
            size: size as _,
            mapped_at_creation: false,
        });

        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        StorageBufferBinder {
            buffer: &self.buffer,
        }
    }

    pub fn bind_writable(&self) -> impl Bindable + '_ {
        StorageBufferBinder {
            buffer: &self.buffer,
        }
    }
}

struct StorageBufferBinder<'a> {
    buffer: &'a wgpu::Buffer,
}

impl Bindable for StorageBufferBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            // Writable storage buffers are not allowed in vertex shaders
            visibility: wgpu::ShaderStages::FRAGMENT
                | wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage {
                    // TODO should say `read_only: true` for readable buffers,
                    //      but rust-gpu is not able to emit appropriate
                    //      attributes yet, causing naga to reject the shader
                    read_only: false,
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        vec![(layout, self.buffer.as_entire_binding())]
    }
}

//! # Vulkan compute backend
//!
//! Runs the fragment kernel on the GPU: one invocation per pixel, 16x16
//! workgroups. The host side only moves data; the packing and the reference
//! evaluation of the kernel live in [`crate::kernel`].
//!
//! ```text
//! FragmentKernel ─┬─ GpuRenderParams ─ binding 0 ─┐
//!                 ├─ GpuSphere[N]    ─ binding 1 ─┼─ raytracing.glsl ─ binding 3 ─ vec4[W*H] ─ ImageBuffer
//!                 └─ GpuLight[M]     ─ binding 2 ─┘
//! ```
//!
//! Empty sphere or light lists still upload one zeroed entry, since Vulkan
//! rejects zero-sized buffers; the counts in the params block keep the shader
//! from reading it.

use std::sync::Arc;
use std::time::Instant;

use image::{ImageBuffer, Rgb};
use log::{debug, info};
use vulkano::{
    buffer::{Buffer, BufferContents, BufferCreateInfo, BufferUsage, Subbuffer},
    command_buffer::{allocator::StandardCommandBufferAllocator, AutoCommandBufferBuilder, CommandBufferUsage},
    descriptor_set::{allocator::StandardDescriptorSetAllocator, DescriptorSet, WriteDescriptorSet},
    device::{
        physical::PhysicalDeviceType, Device, DeviceCreateInfo, DeviceExtensions, Queue, QueueCreateInfo,
        QueueFlags,
    },
    instance::{Instance, InstanceCreateFlags, InstanceCreateInfo},
    memory::allocator::{AllocationCreateInfo, MemoryTypeFilter, StandardMemoryAllocator},
    pipeline::{
        compute::ComputePipelineCreateInfo, layout::PipelineDescriptorSetLayoutCreateInfo, ComputePipeline,
        Pipeline, PipelineBindPoint, PipelineLayout, PipelineShaderStageCreateInfo,
    },
    sync::{self, GpuFuture},
    VulkanLibrary,
};

use crate::kernel::{FragmentKernel, GpuLight, GpuSphere};

const WORKGROUP_SIZE: u32 = 16;

/// Compute pipeline and the device resources it needs.
pub struct VulkanRenderer {
    device: Arc<Device>,
    queue: Arc<Queue>,
    memory_allocator: Arc<StandardMemoryAllocator>,
    descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,
    command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
    compute_pipeline: Arc<ComputePipeline>,
}

impl VulkanRenderer {
    /// Pick a compute-capable device (discrete first) and build the pipeline.
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let library = VulkanLibrary::new()?;
        let instance = Instance::new(
            library,
            InstanceCreateInfo {
                flags: InstanceCreateFlags::ENUMERATE_PORTABILITY,
                ..Default::default()
            },
        )?;

        let device_extensions = DeviceExtensions {
            khr_storage_buffer_storage_class: true,
            ..DeviceExtensions::empty()
        };

        for device in instance.enumerate_physical_devices()? {
            debug!(
                "Vulkan device: {} ({:?})",
                device.properties().device_name,
                device.properties().device_type
            );
        }

        let (physical_device, queue_family_index) = instance
            .enumerate_physical_devices()?
            .filter(|p| p.supported_extensions().contains(&device_extensions))
            .filter_map(|p| {
                p.queue_family_properties()
                    .iter()
                    .position(|q| q.queue_flags.contains(QueueFlags::COMPUTE))
                    .map(|q| (p, q as u32))
            })
            .min_by_key(|(p, _)| match p.properties().device_type {
                PhysicalDeviceType::DiscreteGpu => 0,
                PhysicalDeviceType::IntegratedGpu => 1,
                PhysicalDeviceType::VirtualGpu => 2,
                PhysicalDeviceType::Cpu => 3,
                _ => 4,
            })
            .ok_or("no Vulkan device with a compute queue")?;

        info!(
            "Selected GPU: {} ({:?})",
            physical_device.properties().device_name,
            physical_device.properties().device_type
        );

        let (device, mut queues) = Device::new(
            physical_device,
            DeviceCreateInfo {
                queue_create_infos: vec![QueueCreateInfo {
                    queue_family_index,
                    ..Default::default()
                }],
                enabled_extensions: device_extensions,
                ..Default::default()
            },
        )?;
        let queue = queues.next().ok_or("failed to get compute queue")?;

        let memory_allocator = Arc::new(StandardMemoryAllocator::new_default(device.clone()));
        let descriptor_set_allocator =
            Arc::new(StandardDescriptorSetAllocator::new(device.clone(), Default::default()));
        let command_buffer_allocator =
            Arc::new(StandardCommandBufferAllocator::new(device.clone(), Default::default()));

        let compute_pipeline = Self::create_compute_pipeline(device.clone())?;

        Ok(Self {
            device,
            queue,
            memory_allocator,
            descriptor_set_allocator,
            command_buffer_allocator,
            compute_pipeline,
        })
    }

    fn create_compute_pipeline(device: Arc<Device>) -> Result<Arc<ComputePipeline>, Box<dyn std::error::Error>> {
        let shader = crate::shaders::load_raytracing(device.clone())?;
        let entry_point = shader.entry_point("main").ok_or("kernel has no main entry point")?;
        let stage = PipelineShaderStageCreateInfo::new(entry_point);
        let layout = PipelineLayout::new(
            device.clone(),
            PipelineDescriptorSetLayoutCreateInfo::from_stages([&stage])
                .into_pipeline_layout_create_info(device.clone())?,
        )?;

        Ok(ComputePipeline::new(
            device,
            None,
            ComputePipelineCreateInfo::stage_layout(stage, layout),
        )?)
    }

    fn upload<T, I>(&self, data: I, host_read: bool) -> Result<Subbuffer<[T]>, Box<dyn std::error::Error>>
    where
        T: BufferContents,
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let access = if host_read {
            MemoryTypeFilter::HOST_RANDOM_ACCESS
        } else {
            MemoryTypeFilter::HOST_SEQUENTIAL_WRITE
        };
        Ok(Buffer::from_iter(
            self.memory_allocator.clone(),
            BufferCreateInfo {
                usage: BufferUsage::STORAGE_BUFFER,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE | access,
                ..Default::default()
            },
            data,
        )?)
    }

    /// Evaluate `kernel` for every pixel on the device and read back linear colors.
    pub fn render(&self, kernel: &FragmentKernel) -> Result<ImageBuffer<Rgb<f32>, Vec<f32>>, Box<dyn std::error::Error>> {
        let params = *kernel.params();
        let (width, height) = (params.image_width, params.image_height);
        info!(
            "GPU render {}x{} ({} spheres, {} lights, depth {})",
            width, height, params.sphere_count, params.light_count, params.max_depth
        );

        let spheres = non_empty(kernel.spheres());
        let lights = non_empty(kernel.lights());

        let params_buffer = Buffer::from_data(
            self.memory_allocator.clone(),
            BufferCreateInfo {
                usage: BufferUsage::STORAGE_BUFFER,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            params,
        )?;
        let spheres_buffer: Subbuffer<[GpuSphere]> = self.upload(spheres, false)?;
        let lights_buffer: Subbuffer<[GpuLight]> = self.upload(lights, false)?;
        let output_buffer = self.upload((0..output_len(width, height)).map(|_| [0.0f32; 4]), true)?;

        let layout = self
            .compute_pipeline
            .layout()
            .set_layouts()
            .first()
            .ok_or("pipeline has no descriptor set layout")?;
        let set = DescriptorSet::new(
            self.descriptor_set_allocator.clone(),
            layout.clone(),
            [
                WriteDescriptorSet::buffer(0, params_buffer),
                WriteDescriptorSet::buffer(1, spheres_buffer),
                WriteDescriptorSet::buffer(2, lights_buffer),
                WriteDescriptorSet::buffer(3, output_buffer.clone()),
            ],
            [],
        )?;

        let mut builder = AutoCommandBufferBuilder::primary(
            self.command_buffer_allocator.clone(),
            self.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )?;

        // SAFETY: the descriptor set matches the pipeline layout and every
        // invocation bounds-checks its pixel against the params block
        unsafe {
            builder
                .bind_pipeline_compute(self.compute_pipeline.clone())?
                .bind_descriptor_sets(
                    PipelineBindPoint::Compute,
                    self.compute_pipeline.layout().clone(),
                    0,
                    set,
                )?
                .dispatch([width.div_ceil(WORKGROUP_SIZE), height.div_ceil(WORKGROUP_SIZE), 1])?;
        }

        let command_buffer = builder.build()?;
        let start = Instant::now();
        sync::now(self.device.clone())
            .then_execute(self.queue.clone(), command_buffer)?
            .then_signal_fence_and_flush()?
            .wait(None)?;
        info!("GPU frame rendered in {:.2?}", start.elapsed());

        let output = output_buffer.read()?;
        let mut image: ImageBuffer<Rgb<f32>, Vec<f32>> = ImageBuffer::new(width, height);
        for (pixel, color) in image.pixels_mut().zip(output.iter()) {
            *pixel = Rgb([color[0], color[1], color[2]]);
        }
        Ok(image)
    }
}

/// Pixel count of a frame, computed without u32 overflow.
fn output_len(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn non_empty<T: Copy + bytemuck::Zeroable>(items: &[T]) -> Vec<T> {
    if items.is_empty() {
        vec![T::zeroed()]
    } else {
        items.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_len_does_not_wrap() {
        assert_eq!(output_len(400, 200), 80_000);
        assert_eq!(output_len(70_000, 70_000), 4_900_000_000);
    }

    #[test]
    fn empty_lists_upload_one_zeroed_entry() {
        assert_eq!(non_empty::<GpuSphere>(&[]), vec![GpuSphere::zeroed()]);
    }
}

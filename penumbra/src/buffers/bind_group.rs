use crate::DoubleBufferedBindable;

/// Pair of bind groups sharing a layout; the second one is used on odd
/// frames, so that double-buffered resources can swap roles without the
/// bind groups being rebuilt.
#[derive(Debug)]
pub struct BindGroup {
    bind_groups: [wgpu::BindGroup; 2],
    layout: wgpu::BindGroupLayout,
}

impl BindGroup {
    pub fn builder<'a>(label: impl ToString) -> BindGroupBuilder<'a> {
        BindGroupBuilder {
            label: label.to_string(),
            layouts: Default::default(),
            resources: Default::default(),
        }
    }

    pub fn get(&self, alternate: bool) -> &wgpu::BindGroup {
        &self.bind_groups[alternate as usize]
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }
}

pub struct BindGroupBuilder<'a> {
    label: String,
    layouts: Vec<wgpu::BindGroupLayoutEntry>,
    resources: Vec<[wgpu::BindingResource<'a>; 2]>,
}

impl<'a> BindGroupBuilder<'a> {
    /// Appends given resource; bindings are numbered in the order resources
    /// are added.
    pub fn add(mut self, item: &'a dyn DoubleBufferedBindable) -> Self {
        for (layout, resources) in item.bind(self.resources.len() as u32) {
            self.layouts.push(layout);
            self.resources.push(resources);
        }

        self
    }

    pub fn build(self, device: &wgpu::Device) -> BindGroup {
        let label = format!("penumbra_{}", self.label);

        let layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label}_layout")),
                entries: &self.layouts,
            });

        let mut entries: [Vec<_>; 2] = Default::default();

        for (binding, resources) in self.resources.into_iter().enumerate() {
            for (entries, resource) in entries.iter_mut().zip(resources) {
                entries.push(wgpu::BindGroupEntry {
                    binding: binding as u32,
                    resource,
                });
            }
        }

        let bind_groups = entries.map(|entries| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&label),
                layout: &layout,
                entries: &entries,
            })
        });

        BindGroup {
            bind_groups,
            layout,
        }
    }
}

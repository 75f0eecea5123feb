/// Resource that can be attached to a bind group: a buffer, a texture, a
/// single mip of a texture etc.
pub trait Bindable {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)>;
}

/// Resource that exists in two versions, one for even and one for odd
/// frames; bind groups created out of it come in pairs as well.
pub trait DoubleBufferedBindable {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])>;
}

/// Single-buffered resources are bound the same way on both frames.
impl<T> DoubleBufferedBindable for T
where
    T: Bindable,
{
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])> {
        Bindable::bind(self, binding)
            .into_iter()
            .map(|(layout, resource)| (layout, [resource.clone(), resource]))
            .collect()
    }
}

/// Bunch of resources bound at consecutive bindings, for sets that are
/// shared by many passes.
#[derive(Default)]
pub struct Bindings<'a> {
    items: Vec<Box<dyn DoubleBufferedBindable + 'a>>,
}

impl<'a> Bindings<'a> {
    pub fn with(mut self, item: impl DoubleBufferedBindable + 'a) -> Self {
        self.items.push(Box::new(item));
        self
    }
}

impl DoubleBufferedBindable for Bindings<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])> {
        let mut entries = Vec::new();

        for item in &self.items {
            let binding = binding + entries.len() as u32;

            entries.extend(item.bind(binding));
        }

        entries
    }
}

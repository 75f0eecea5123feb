use crate::{Bindable, DoubleBufferedBindable, Texture};

/// Resource existing in two copies: one is written on even frames (and read
/// as history on odd ones), the other one the other way around.
#[derive(Debug)]
pub struct DoubleBuffered<T> {
    a: T,
    b: T,
}

impl<T> DoubleBuffered<T> {
    pub fn new(mut f: impl FnMut(&str) -> T) -> Self {
        Self { a: f("a"), b: f("b") }
    }

    pub fn get(&self, alternate: bool) -> &T {
        if alternate {
            &self.b
        } else {
            &self.a
        }
    }

    /// Returns the copy written during the current frame.
    pub fn curr(&self) -> DoubleBuffered<&T> {
        DoubleBuffered {
            a: &self.a,
            b: &self.b,
        }
    }

    /// Returns the copy written during the previous frame.
    pub fn prev(&self) -> DoubleBuffered<&T> {
        DoubleBuffered {
            a: &self.b,
            b: &self.a,
        }
    }
}

impl DoubleBuffered<Texture> {
    pub fn texture(
        device: &wgpu::Device,
        label: &str,
        size: glam::UVec2,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::new(|suffix| {
            Texture::new(device, format!("{label}_{suffix}"), size, format)
        })
    }
}

impl<'a> DoubleBuffered<&'a Texture> {
    pub fn bind_readable(&self) -> impl DoubleBufferedBindable + 'a {
        self.bind_readable_mip(0)
    }

    pub fn bind_readable_mip(
        &self,
        mip: u32,
    ) -> impl DoubleBufferedBindable + 'a {
        DoubleBufferedBinder {
            a: self.a.bind_readable_mip(mip),
            b: self.b.bind_readable_mip(mip),
        }
    }

    pub fn bind_writable(&self) -> impl DoubleBufferedBindable + 'a {
        self.bind_writable_mip(0)
    }

    pub fn bind_writable_mip(
        &self,
        mip: u32,
    ) -> impl DoubleBufferedBindable + 'a {
        DoubleBufferedBinder {
            a: self.a.bind_writable_mip(mip),
            b: self.b.bind_writable_mip(mip),
        }
    }
}

pub struct DoubleBufferedBinder<T> {
    a: T,
    b: T,
}

impl<T> DoubleBufferedBindable for DoubleBufferedBinder<T>
where
    T: Bindable,
{
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])> {
        let entries_a = self.a.bind(binding);
        let entries_b = self.b.bind(binding);

        assert_eq!(entries_a.len(), entries_b.len());

        entries_a
            .into_iter()
            .zip(entries_b)
            .map(|((layout_a, resource_a), (layout_b, resource_b))| {
                assert_eq!(layout_a, layout_b);

                (layout_a, [resource_a, resource_b])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curr_and_prev_swap_roles() {
        let buffer = DoubleBuffered::new(|suffix| suffix.to_string());

        assert_eq!("a", *buffer.curr().get(false));
        assert_eq!("b", *buffer.curr().get(true));
        assert_eq!("b", *buffer.prev().get(false));
        assert_eq!("a", *buffer.prev().get(true));
    }
}

mod bind_group;
mod bindable;
mod double_buffered;
mod mapped_uniform_buffer;
mod storage_buffer;
mod texture;

pub use self::bind_group::*;
pub use self::bindable::*;
pub use self::double_buffered::*;
pub use self::mapped_uniform_buffer::*;
pub use self::storage_buffer::*;
pub use self::texture::*;

/// Pads given buffer size so that it satisfies wgpu's alignment
/// requirements (and is never zero).
fn pad_size(size: usize) -> usize {
    (size.max(1) + 31) & !31
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding() {
        assert_eq!(32, pad_size(0));
        assert_eq!(32, pad_size(4));
        assert_eq!(32, pad_size(32));
        assert_eq!(64, pad_size(33));
    }
}

use bytemuck::{Pod, Zeroable};

/// Monotonic frame counter; its lowest bit selects the ping-pong side of
/// double-buffered resources.
#[repr(C)]
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Pod, Zeroable,
)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Frame(u32);

impl Frame {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_alternate(self) -> bool {
        self.0 % 2 == 1
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong() {
        let frame = Frame::new(0);

        assert!(!frame.is_alternate());
        assert!(frame.next().is_alternate());
        assert!(!frame.next().next().is_alternate());
    }

    #[test]
    fn wraps_around() {
        assert_eq!(Frame::new(0), Frame::new(u32::MAX).next());
    }
}

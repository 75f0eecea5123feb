use crate::{Engine, Event};

pub trait EventHandler {
    fn handle(&mut self, ctxt: EventHandlerContext);
}

#[derive(Clone, Copy)]
pub struct EventHandlerContext<'a> {
    pub engine: &'a Engine,
    pub device: &'a wgpu::Device,
    pub event: Event,
}

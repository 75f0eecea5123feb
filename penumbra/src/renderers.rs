use std::collections::HashMap;

use crate::Renderer;

#[derive(Debug, Default)]
pub struct Renderers {
    renderers: HashMap<RendererHandle, Renderer>,
    next_id: usize,
}

impl Renderers {
    pub fn add(&mut self, renderer: Renderer) -> RendererHandle {
        let handle = RendererHandle(self.next_id);

        self.renderers.insert(handle, renderer);
        self.next_id += 1;

        handle
    }

    pub fn get(&self, handle: RendererHandle) -> &Renderer {
        self.renderers.get(&handle).unwrap_or_else(|| {
            panic!("Renderer does not exist: {:?}", handle)
        })
    }

    pub fn get_mut(&mut self, handle: RendererHandle) -> &mut Renderer {
        self.renderers.get_mut(&handle).unwrap_or_else(|| {
            panic!("Renderer does not exist: {:?}", handle)
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Renderer> + '_ {
        self.renderers.values_mut()
    }

    pub fn remove(&mut self, handle: RendererHandle) {
        self.renderers.remove(&handle);
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RendererHandle(usize);

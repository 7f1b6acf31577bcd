//! Named, z-ordered raster layers and their composite.
//!
//! Every layer in a stack has the stack's dimensions, so image-pixel
//! coordinates are shared by all of them. Visibility only affects
//! `composite`; a hidden layer keeps its pixels.

use crate::surface::{RasterSurface, SurfaceSnapshot};
use smallvec::SmallVec;
use std::collections::HashMap;
use wm_core::{Color, LayerId, SurfaceError};

/// Misuse of a [`LayerStack`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    #[error("layer {0} already exists")]
    DuplicateLayer(LayerId),

    #[error("no layer named {0}")]
    UnknownLayer(LayerId),

    #[error("snapshot is {found:?}, layer is {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("layer stack has been released")]
    Released,

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// One independently visible raster surface.
#[derive(Debug)]
pub struct RasterLayer {
    id: LayerId,
    z_index: i32,
    visible: bool,
    surface: RasterSurface,
}

impl RasterLayer {
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut RasterSurface {
        &mut self.surface
    }
}

/// Owns every layer surface of one loaded image plus the composite output.
#[derive(Debug)]
pub struct LayerStack {
    width: u32,
    height: u32,
    background: Color,
    layers: HashMap<LayerId, RasterLayer>,
    /// Creation order, used to break z-index ties.
    order: SmallVec<[LayerId; 8]>,
    output: Option<RasterSurface>,
}

impl LayerStack {
    /// An empty stack for `width × height` images. `background` is forced opaque.
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self, SurfaceError> {
        let background = Color { a: 255, ..background };
        let output = RasterSurface::filled(width, height, background)?;
        Ok(Self {
            width,
            height,
            background,
            layers: HashMap::new(),
            order: SmallVec::new(),
            output: Some(output),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn is_released(&self) -> bool {
        self.output.is_none()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Allocate a transparent layer.
    pub fn create_layer(&mut self, id: LayerId, z_index: i32) -> Result<&mut RasterLayer, LayerError> {
        if self.is_released() {
            return Err(LayerError::Released);
        }
        if self.layers.contains_key(&id) {
            return Err(LayerError::DuplicateLayer(id));
        }
        let surface = RasterSurface::new(self.width, self.height)?;
        log::debug!("layer {id} created at z={z_index}");
        self.order.push(id);
        Ok(self.layers.entry(id).or_insert(RasterLayer {
            id,
            z_index,
            visible: true,
            surface,
        }))
    }

    pub fn layer(&self, id: LayerId) -> Option<&RasterLayer> {
        self.layers.get(&id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Result<&mut RasterLayer, LayerError> {
        if self.is_released() {
            return Err(LayerError::Released);
        }
        self.layers.get_mut(&id).ok_or(LayerError::UnknownLayer(id))
    }

    pub fn surface_mut(&mut self, id: LayerId) -> Result<&mut RasterSurface, LayerError> {
        self.layer_mut(id).map(RasterLayer::surface_mut)
    }

    /// Flip the visibility flag. Pixels are untouched.
    pub fn set_visibility(&mut self, id: LayerId, visible: bool) -> Result<(), LayerError> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn is_visible(&self, id: LayerId) -> bool {
        self.layers.get(&id).is_some_and(|l| l.visible)
    }

    pub fn snapshot(&self, id: LayerId) -> Result<SurfaceSnapshot, LayerError> {
        if self.is_released() {
            return Err(LayerError::Released);
        }
        self.layers
            .get(&id)
            .map(|l| l.surface.snapshot())
            .ok_or(LayerError::UnknownLayer(id))
    }

    /// Replace a layer's pixels with a snapshot. Visibility is unchanged.
    pub fn restore(&mut self, id: LayerId, snapshot: &SurfaceSnapshot) -> Result<(), LayerError> {
        let expected = self.dimensions();
        let layer = self.layer_mut(id)?;
        if snapshot.dimensions() != expected {
            return Err(LayerError::SizeMismatch {
                expected,
                found: snapshot.dimensions(),
            });
        }
        layer.surface.copy_from(snapshot);
        Ok(())
    }

    pub fn clear_layer(&mut self, id: LayerId) -> Result<(), LayerError> {
        self.surface_mut(id)?.clear();
        Ok(())
    }

    /// Layer ids in paint order: ascending z-index, ties in creation order.
    pub fn paint_order(&self) -> SmallVec<[LayerId; 8]> {
        let mut ids = self.order.clone();
        // stable sort keeps creation order for equal z
        ids.sort_by_key(|id| self.layers.get(id).map_or(0, |l| l.z_index));
        ids
    }

    /// Repaint the output: opaque background, then every visible layer source-over.
    pub fn composite(&mut self) -> Result<&RasterSurface, LayerError> {
        let order = self.paint_order();
        let output = self.output.as_mut().ok_or(LayerError::Released)?;
        output.fill(self.background);
        for id in order {
            if let Some(layer) = self.layers.get(&id).filter(|l| l.visible) {
                output.draw_over(&layer.surface);
            }
        }
        log::trace!("composited {} layers", self.layers.len());
        Ok(output)
    }

    /// The result of the last `composite`, or `None` once released.
    pub fn output(&self) -> Option<&RasterSurface> {
        self.output.as_ref()
    }

    /// Drop every surface. Calling it again does nothing.
    pub fn cleanup(&mut self) {
        if self.output.take().is_some() {
            log::debug!("layer stack {}x{} released", self.width, self.height);
        }
        self.layers.clear();
        self.order.clear();
    }
}

use super::rendering::GpuAck;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneKind {
    Chars,
    Foreground,
    Background,
}

impl PlaneKind {
    /// Upload order used by the frame loop.
    pub const ALL: [PlaneKind; 3] = [
        PlaneKind::Foreground,
        PlaneKind::Background,
        PlaneKind::Chars,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneState {
    Clean,
    Dirty,
}

/// One grid buffer plus its dirty flag.
///
/// Content writes move the plane to `Dirty`. The only way back to `Clean` is
/// [`Plane::acknowledge`], which needs a [`GpuAck`] from a finished render
/// pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    cells: Vec<u8>,
    state: PlaneState,
}

impl Plane {
    /// A fresh plane starts dirty so its first contents reach the GPU.
    pub fn new(cell_count: usize) -> Self {
        Self {
            cells: vec![0; cell_count],
            state: PlaneState::Dirty,
        }
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Mutable access always marks the plane dirty.
    pub fn cells_mut(&mut self) -> &mut [u8] {
        self.state = PlaneState::Dirty;
        &mut self.cells
    }

    /// Writes one cell and returns whether its value changed. Out-of-range
    /// indices are ignored.
    pub fn set(&mut self, index: usize, value: u8) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) if *cell != value => {
                *cell = value;
                self.state = PlaneState::Dirty;
                true
            }
            _ => false,
        }
    }

    pub fn fill(&mut self, value: u8) {
        self.cells.fill(value);
        self.state = PlaneState::Dirty;
    }

    pub fn resize(&mut self, cell_count: usize) {
        if self.cells.len() == cell_count {
            return;
        }
        self.cells.resize(cell_count, 0);
        self.state = PlaneState::Dirty;
    }

    pub fn mark_dirty(&mut self) {
        self.state = PlaneState::Dirty;
    }

    pub fn state(&self) -> PlaneState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == PlaneState::Dirty
    }

    pub fn acknowledge(&mut self, _ack: &GpuAck) {
        self.state = PlaneState::Clean;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneSet {
    pub screen: Plane,
    pub fg_colors: Plane,
    pub bg_colors: Plane,
}

impl PlaneSet {
    pub fn new(cell_count: usize) -> Self {
        Self {
            screen: Plane::new(cell_count),
            fg_colors: Plane::new(cell_count),
            bg_colors: Plane::new(cell_count),
        }
    }

    pub fn get(&self, kind: PlaneKind) -> &Plane {
        match kind {
            PlaneKind::Chars => &self.screen,
            PlaneKind::Foreground => &self.fg_colors,
            PlaneKind::Background => &self.bg_colors,
        }
    }

    pub fn get_mut(&mut self, kind: PlaneKind) -> &mut Plane {
        match kind {
            PlaneKind::Chars => &mut self.screen,
            PlaneKind::Foreground => &mut self.fg_colors,
            PlaneKind::Background => &mut self.bg_colors,
        }
    }

    pub fn resize(&mut self, cell_count: usize) {
        for kind in PlaneKind::ALL {
            self.get_mut(kind).resize(cell_count);
        }
    }

    pub fn any_dirty(&self) -> bool {
        PlaneKind::ALL.iter().any(|kind| self.get(*kind).is_dirty())
    }

    pub fn acknowledge_all(&mut self, ack: &GpuAck) {
        for kind in PlaneKind::ALL {
            self.get_mut(kind).acknowledge(ack);
        }
    }
}

/// Handle for a polyline drawn on the viewport.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolylineId(pub u64);

/// Handle for a live marker on the viewport.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

/// Handle for an eased viewport flight.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlightId(pub u64);

/// Monotonic id source; ids are never reused within a session.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_raw(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }

    pub fn polyline(&mut self) -> PolylineId {
        PolylineId(self.next_raw())
    }

    pub fn marker(&mut self) -> MarkerId {
        MarkerId(self.next_raw())
    }

    pub fn flight(&mut self) -> FlightId {
        FlightId(self.next_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::IdAllocator;

    #[test]
    fn ids_are_unique_across_kinds() {
        let mut ids = IdAllocator::new();
        let a = ids.polyline();
        let b = ids.marker();
        let c = ids.flight();
        assert_eq!((a.0, b.0, c.0), (0, 1, 2));
    }
}

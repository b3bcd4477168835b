//! Circular dependency detection infrastructure.

use std::any::Any;

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 1024;

/// One entry of a scope's construction stack.
///
/// Frames compare by registration index, not by interface, so a second
/// registration of an interface may depend on that interface (and get the
/// first registration) without looking like a cycle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    index: usize,
    name: &'static str,
}

impl Frame {
    pub(crate) fn new(index: usize, name: &'static str) -> Self {
        Self { index, name }
    }
}

/// Guard for one frame of a scope's construction stack.
///
/// Entering pushes the frame; dropping pops it again, including when
/// construction bails out with an error or a panic.
pub(crate) struct ResolutionGuard<'a> {
    stack: &'a Mutex<Vec<Frame>>,
    index: usize,
}

impl<'a> ResolutionGuard<'a> {
    pub(crate) fn enter(stack: &'a Mutex<Vec<Frame>>, frame: Frame) -> DiResult<Self> {
        let mut frames = stack.lock();

        // Circular detection BEFORE pushing the new frame
        if frames.iter().any(|f| f.index == frame.index) {
            let mut path: Vec<&'static str> = frames.iter().map(|f| f.name).collect();
            path.push(frame.name);
            return Err(DiError::Circular(path));
        }

        if frames.len() >= MAX_DEPTH {
            return Err(DiError::DepthExceeded(frames.len()));
        }

        frames.push(frame);
        Ok(Self {
            stack,
            index: frame.index,
        })
    }
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        let mut frames = self.stack.lock();
        if let Some(last) = frames.pop() {
            debug_assert_eq!(last.index, self.index);
        }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(stack: &Mutex<Vec<Frame>>) -> Vec<&'static str> {
        stack.lock().iter().map(|f| f.name).collect()
    }

    #[test]
    fn guard_pops_on_drop() {
        let stack = Mutex::new(Vec::new());
        {
            let _a = ResolutionGuard::enter(&stack, Frame::new(0, "A")).unwrap();
            let _b = ResolutionGuard::enter(&stack, Frame::new(1, "B")).unwrap();
            assert_eq!(names(&stack), vec!["A", "B"]);
        }
        assert!(stack.lock().is_empty());
    }

    #[test]
    fn reentering_reports_full_path() {
        let stack = Mutex::new(Vec::new());
        let _a = ResolutionGuard::enter(&stack, Frame::new(0, "A")).unwrap();
        let _b = ResolutionGuard::enter(&stack, Frame::new(1, "B")).unwrap();
        match ResolutionGuard::enter(&stack, Frame::new(0, "A")) {
            Err(DiError::Circular(path)) => assert_eq!(path, vec!["A", "B", "A"]),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("cycle was not detected"),
        }
        // The failed entry must not leave a frame behind
        assert_eq!(stack.lock().len(), 2);
    }

    #[test]
    fn same_interface_different_registration_is_not_a_cycle() {
        let stack = Mutex::new(Vec::new());
        let _outer = ResolutionGuard::enter(&stack, Frame::new(1, "dyn Part")).unwrap();
        let _inner = ResolutionGuard::enter(&stack, Frame::new(0, "dyn Part")).unwrap();
        assert_eq!(names(&stack), vec!["dyn Part", "dyn Part"]);
    }

    #[test]
    fn panic_message_extracts_strings() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}

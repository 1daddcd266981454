use std::fmt;
use std::sync::{Arc, Mutex};

use composure::{Bus, Element, ElementState, Message, SeekEvent};

struct Inner {
    pad: Option<u32>,
    states: Vec<ElementState>,
    seeks: Vec<SeekEvent>,
}

/// A clip's underlying media object, standing in for a real framework element in tests: an
/// output pad that can be set late (to exercise the deferred-port path) and a record of every
/// state transition and seek it was sent.
#[derive(Clone)]
pub struct FakeElement {
    inner: Arc<Mutex<Inner>>,
}
impl FakeElement {
    pub fn new(pad: Option<u32>) -> Self {
        FakeElement {
            inner: Arc::new(Mutex::new(Inner {
                pad,
                states: Vec::new(),
                seeks: Vec::new(),
            })),
        }
    }

    pub fn ready() -> Self {
        Self::new(Some(0))
    }

    pub fn pending() -> Self {
        Self::new(None)
    }

    pub fn set_pad(&self, pad: u32) {
        self.inner.lock().unwrap().pad = Some(pad);
    }

    pub fn states(&self) -> Vec<ElementState> {
        self.inner.lock().unwrap().states.clone()
    }

    pub fn last_state(&self) -> Option<ElementState> {
        self.inner.lock().unwrap().states.last().copied()
    }

    pub fn seeks(&self) -> Vec<SeekEvent> {
        self.inner.lock().unwrap().seeks.clone()
    }
}
impl Element for FakeElement {
    type Pad = u32;

    fn output_pad(&self) -> Option<u32> {
        self.inner.lock().unwrap().pad
    }

    fn set_state(&self, state: ElementState) {
        self.inner.lock().unwrap().states.push(state);
    }

    fn send_seek(&self, seek: &SeekEvent) {
        self.inner.lock().unwrap().seeks.push(*seek);
    }
}

/// A caller-defined bus payload, standing in for whatever real message type a host would use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestMessage(pub &'static str);
impl fmt::Display for TestMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct BusInner {
    forwarded: Vec<TestMessage>,
    eos_count: u32,
}

/// Records everything forwarded to it and every end-of-stream it was asked to post, so tests
/// can assert on both without needing a real downstream bus.
pub struct FakeBus {
    inner: Mutex<BusInner>,
}
impl FakeBus {
    pub fn new() -> Self {
        FakeBus {
            inner: Mutex::new(BusInner {
                forwarded: Vec::new(),
                eos_count: 0,
            }),
        }
    }

    pub fn forwarded(&self) -> Vec<TestMessage> {
        self.inner.lock().unwrap().forwarded.clone()
    }

    pub fn eos_count(&self) -> u32 {
        self.inner.lock().unwrap().eos_count
    }
}
impl Bus<TestMessage> for FakeBus {
    fn forward(&self, msg: Message<TestMessage>) {
        if let Message::Other(m) = msg {
            self.inner.lock().unwrap().forwarded.push(m);
        }
    }

    fn post_eos(&self) {
        self.inner.lock().unwrap().eos_count += 1;
    }
}

/// `Composition` takes its bus by value; tests hand it an `Arc<FakeBus>` clone so they can keep
/// a handle to assert against after construction.
impl Bus<TestMessage> for Arc<FakeBus> {
    fn forward(&self, msg: Message<TestMessage>) {
        self.as_ref().forward(msg)
    }

    fn post_eos(&self) {
        self.as_ref().post_eos()
    }
}

//! The response map / waker map pair and the `wait_for_response` discipline
//! that avoids a waker/response race. Both maps live behind one mutex;
//! nothing here ever holds that mutex across I/O or across the blocking
//! wait itself.

use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::Sender;
use execunit_tlv::Tlv;
use parking_lot::Mutex;

use crate::protocol::CHILD_DATA;

struct State {
    responses: HashMap<i32, Tlv>,
    wakers: HashMap<i32, Sender<()>>,
}

pub(crate) struct Correlation {
    state: Mutex<State>,
}

impl Correlation {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                responses: HashMap::new(),
                wakers: HashMap::new(),
            }),
        }
    }

    /// Called from the pump thread when a response-bearing TLV carrying
    /// sequence `id` arrives. Stores the response *before* signaling any
    /// waker — the order the three-step discipline depends on.
    pub(crate) fn deliver(&self, id: i32, tlv: Tlv) {
        let mut state = self.state.lock();
        state.responses.insert(id, tlv);
        if let Some(waker) = state.wakers.remove(&id) {
            let _ = waker.send(());
        }
    }

    /// Block the calling thread for the response to `id`, up to `timeout`
    /// (`None` = wait forever, as the two named request APIs do).
    ///
    /// 1. Under the response mutex: if the response is already present,
    ///    take it, drop any stale waker entry, return its `0x04` payload.
    /// 2. Otherwise register a fresh one-shot waker for `id` *in the same
    ///    critical section* (so a response can never slip in unobserved
    ///    between the check and the registration), release the mutex, and
    ///    wait.
    /// 3. On timeout, remove the waker and return `None`; on wake,
    ///    re-check the map under the mutex rather than trusting the signal
    ///    alone.
    pub(crate) fn wait(&self, id: i32, timeout: Option<Duration>) -> Option<Vec<u8>> {
        let rx = {
            let mut state = self.state.lock();
            if let Some(tlv) = state.responses.remove(&id) {
                state.wakers.remove(&id);
                return extract_payload(&tlv);
            }
            let (tx, rx) = crossbeam_channel::bounded(1);
            state.wakers.insert(id, tx);
            rx
        };

        let signaled = match timeout {
            None => rx.recv().is_ok(),
            Some(d) => rx.recv_timeout(d).is_ok(),
        };

        let mut state = self.state.lock();
        if !signaled {
            state.wakers.remove(&id);
            return None;
        }
        let response = state.responses.remove(&id);
        state.wakers.remove(&id);
        drop(state);
        response.and_then(|tlv| extract_payload(&tlv))
    }

    /// Dispose extension: after transport teardown, destroy all remaining
    /// wakers and clear both maps.
    pub(crate) fn dispose(&self) {
        let mut state = self.state.lock();
        state.wakers.clear();
        state.responses.clear();
    }
}

fn extract_payload(tlv: &Tlv) -> Option<Vec<u8>> {
    tlv.get_child(CHILD_DATA, 0).and_then(|c| c.as_bytes().ok())
}

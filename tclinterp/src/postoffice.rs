use crossbeam_channel::{Receiver, Sender};

use crate::{error::Result, obj::TclObj};

pub type Job = Box<dyn FnOnce() + Send>;

/// Requests other threads send to the interpreter's owner thread.
pub enum TclRequest {
    Call(Vec<String>, Sender<TclResponse>),
    Run(Job),
}

#[derive(Debug)]
pub enum TclResponse {
    Call(Result<TclObj>),
}

#[derive(Clone)]
pub struct PostOffice {
    pub sender: Sender<TclRequest>,
    pub receiver: Receiver<TclRequest>,
}

impl PostOffice {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }
}

impl std::fmt::Debug for TclRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TclRequest::Call(argv, _) => f.debug_tuple("Call").field(argv).finish(),
            TclRequest::Run(_) => f.write_str("Run(..)"),
        }
    }
}

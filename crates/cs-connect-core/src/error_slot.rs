use cs_connector::ConnectorError;
use std::cell::RefCell;
use std::rc::Rc;

/// Setter for the single error slot owned by the widget's parent.
pub trait ErrorSink {
    fn set_error(&self, error: Option<ConnectorError>);
}

type Listener = Rc<dyn Fn(Option<&ConnectorError>)>;

/// Observable error slot.
#[derive(Default)]
pub struct ErrorSlot {
    error: RefCell<Option<ConnectorError>>,
    listeners: RefCell<Vec<Listener>>,
}

impl ErrorSlot {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn get(&self) -> Option<ConnectorError> {
        self.error.borrow().clone()
    }

    pub fn subscribe(&self, listener: impl Fn(Option<&ConnectorError>) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }
}

impl ErrorSink for ErrorSlot {
    fn set_error(&self, error: Option<ConnectorError>) {
        {
            let mut slot = self.error.borrow_mut();
            if *slot == error {
                return;
            }
            *slot = error.clone();
        }
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(error.as_ref());
        }
    }
}

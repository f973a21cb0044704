// Represents the current high-level state of the application UI
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum State {
    Initialising, // App is starting, loading the backend
    Running,      // Main window with status and capture controls
    About,        // Showing the about screen
}

// Backend and link indicators. Display only, no transitions are enforced.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Status {
    #[default]
    Down,
    Up,
}

impl Status {
    pub fn is_up(&self) -> bool {
        *self == Status::Up
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Status::Down => write!(f, "DOWN"),
            Status::Up => write!(f, "UP"),
        }
    }
}

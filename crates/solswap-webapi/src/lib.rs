// ----- standard library imports
// ----- extra library imports
// ----- local modules
pub mod swap;

// ----- end imports

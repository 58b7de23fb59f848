// Workflow topology administration and picker queries
pub mod stages;

// The allocation ledger and the movement engine
pub mod movements;

// Export order intake and read models
pub mod orders;

// Append-only movement trail
pub mod history;

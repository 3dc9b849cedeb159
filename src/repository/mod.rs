pub mod assignments;
pub mod freights;
pub mod profiles;

pub use assignments::AssignmentRepository;
pub use freights::FreightRepository;
pub use profiles::ProfileRepository;

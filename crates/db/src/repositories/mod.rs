//! Repository abstractions for data access.
//!
//! Every tenant-owned lookup takes the tenant id and filters by it; a row from
//! another tenant is indistinguishable from a missing one.

pub mod care_plan;
pub mod case_note;
pub mod client;
pub mod invoice;
pub mod medication;
pub mod session;
pub mod shift;
pub mod tenant;
pub mod user;

pub use care_plan::{CarePlanError, CarePlanRepository, CreateCarePlanInput, UpdateCarePlanInput};
pub use case_note::{CaseNoteError, CaseNoteRepository, CreateCaseNoteInput, UpdateCaseNoteInput};
pub use client::{ClientFilter, ClientRepository, CreateClientInput, UpdateClientInput};
pub use invoice::{
    CreateInvoiceInput, InvoiceError, InvoiceFilter, InvoiceRepository, InvoiceWithLines,
};
pub use medication::{MedicationError, MedicationRepository, RecordMedicationInput};
pub use session::{NewSession, SessionRepository};
pub use shift::{
    CreateShiftInput, CreatedSeries, ShiftFilter, ShiftRepoError, ShiftRepository,
    UpdateShiftInput,
};
pub use tenant::TenantRepository;
pub use user::{CreateUserInput, UserRepository};

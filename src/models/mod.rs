//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod account;
pub mod content;
pub mod donor;
pub mod hostel;
pub mod role;
pub mod student;

// Re-export commonly used models
pub use account::{Account, AuthUser, CreateAccountRequest};
pub use content::{
    BlogPost, ContactSubmission, CreateBlogPostRequest, CreateContactRequest, CreateEventRequest,
    CreateMediaRequest, CreatePodcastRequest, CreatePressReleaseRequest, CreateScholarshipRequest,
    CreateTicketRequest, Event, MediaItem, Podcast, PressRelease, Scholarship, ScholarshipStatus,
    Ticket, TicketPriority, TicketStatus, UpdateBlogPostRequest, UpdateContactRequest,
    UpdateEventRequest, UpdateMediaRequest, UpdatePodcastRequest, UpdatePressReleaseRequest,
    UpdateScholarshipRequest, UpdateTicketRequest,
};
pub use donor::{
    CreateDonationRequest, CreateDonorRequest, CreateTrusteeRequest, Donation, Donor, ImpactLevel,
    Trustee, UpdateDonorTotalsRequest,
};
pub use hostel::{
    CreateHostelRequest, CreateInstitutionRequest, Hostel, Institution, OrganizationStatus,
    UpdateHostelRequest, UpdateInstitutionRequest,
};
pub use role::{AssignRoleRequest, Role, UpdateRoleRequest, UserRole};
pub use student::{
    Application, ApplicationStatus, CreateApplicationRequest, CreateStudentRequest, Student,
    UpdateApplicationStatusRequest,
};

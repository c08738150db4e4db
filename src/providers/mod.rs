pub mod channel;
pub mod supabase;

pub use channel::ChannelSource;
pub use supabase::SupabaseSource;

pub mod ad_types;
pub mod advertisement_comments;
pub mod advertisement_genres;
pub mod advertisement_skills;
pub mod advertisements;
pub mod bookmarks;
pub mod cities;
pub mod conversation_participants;
pub mod conversations;
pub mod feedback;
pub mod genres;
pub mod inbox_messages;
pub mod open_mic_comments;
pub mod open_mic_genres;
pub mod open_mics;
pub mod profile_genres;
pub mod profile_skills;
pub mod profile_types;
pub mod profiles;
pub mod reports;
pub mod skills;
pub mod users;

//! Wire protocol
//!
//! Frames, event names, typed payloads and the room-key value object.

mod client;
mod events;
mod frame;
mod room;

pub use client::{
    AuthenticatedMessageRequest, ClientEventType, JoinRoomRequest, LeaveRoomRequest,
    PrivateMessageRequest, RoomMessageRequest, TypingRequest,
};
pub use events::{
    EventType, OnlineUserPayload, OnlineUsersPayload, PrivateMessagePayload, ReconnectedPayload,
    RoomMemberPayload, RoomMessagePayload, TypingPayload, UserConnectedPayload,
    UserDisconnectedPayload, UserJoinedRoomPayload, UserLeftRoomPayload, WelcomePayload,
};
pub use frame::EventFrame;
pub use room::{RoomKey, MAX_ROOM_KEY_LEN};

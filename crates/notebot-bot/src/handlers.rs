//! Event handlers.
//!
//! [`App::handle`] is the single entry point for chat events. It reads the
//! sender's session once, resolves the internal user, dispatches the event,
//! and writes the session back once. Handlers never fail the caller: storage
//! problems become a log line plus a user message, and transport problems
//! end the handler early with an ERROR log.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use notebot_core::{
    ChatEvent, ChatTransport, Draft, Error, Keyboard, MessageOptions, Note, NoteStore, Result,
};

use crate::keyboard::{self, ListContext};
use crate::messages;
use crate::router::{Command, ComposeAction, EditAction, Route};
use crate::session::{Session, SessionStore};
use crate::state::{self, Field, Flow, Prompt, Status, Step};

/// Who a handler is talking to.
#[derive(Debug, Clone, Copy)]
struct Ctx {
    chat_id: i64,
    user_id: i64,
}

/// The bot: note store, chat transport and session table.
#[derive(Clone)]
pub struct App {
    store: Arc<dyn NoteStore>,
    transport: Arc<dyn ChatTransport>,
    sessions: Arc<dyn SessionStore>,
}

fn menu(flow: Flow) -> Keyboard {
    match flow {
        Flow::Compose => keyboard::compose_menu(),
        Flow::Edit => keyboard::edit_menu(),
    }
}

fn with_keyboard(options: MessageOptions, keyboard: Keyboard) -> MessageOptions {
    if keyboard.is_empty() {
        options
    } else {
        options.with_keyboard(keyboard)
    }
}

impl App {
    pub fn new(
        store: Arc<dyn NoteStore>,
        transport: Arc<dyn ChatTransport>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            store,
            transport,
            sessions,
        }
    }

    /// Process one chat event end to end.
    pub async fn handle(&self, event: ChatEvent) {
        let sender = event.sender().clone();
        let chat_id = event.chat_id();
        let mut session = self.sessions.get(sender.id);

        if let ChatEvent::Callback { id, .. } = &event {
            if let Err(e) = self.transport.answer_callback(id).await {
                warn!(
                    subsystem = "bot",
                    component = "handlers",
                    chat_id,
                    error = %e,
                    "Failed to acknowledge callback"
                );
            }
        }

        let user_id = match session.user_id {
            Some(id) => id,
            None => match self
                .store
                .ensure_user(sender.id, sender.name.as_deref())
                .await
            {
                Ok(id) => {
                    debug!(
                        subsystem = "bot",
                        component = "handlers",
                        external_id = sender.id,
                        user_id = id,
                        "User resolved"
                    );
                    session.user_id = Some(id);
                    id
                }
                Err(e) => {
                    error!(
                        subsystem = "bot",
                        component = "handlers",
                        op = "ensure_user",
                        external_id = sender.id,
                        error = %e,
                        "Failed to resolve user, dropping event"
                    );
                    return;
                }
            },
        };

        let ctx = Ctx { chat_id, user_id };
        let kind = event.kind();
        let result = match event {
            ChatEvent::Command { command, .. } => match Command::parse(&command) {
                Some(command) => self.on_command(ctx, &mut session, command).await,
                None => {
                    debug!(subsystem = "bot", command = %command, "Unknown command ignored");
                    Ok(())
                }
            },
            ChatEvent::Text { text, .. } => self.on_text(ctx, &mut session, &text).await,
            ChatEvent::Callback {
                data, message_id, ..
            } => match Route::parse(&data) {
                Some(route) => self.on_route(ctx, &mut session, route, message_id).await,
                None => {
                    debug!(subsystem = "bot", payload = %data, "Unknown route dropped");
                    Ok(())
                }
            },
        };

        if let Err(e) = result {
            error!(
                subsystem = "bot",
                component = "handlers",
                event = kind,
                chat_id,
                user_id,
                error = %e,
                "Failed to deliver reply"
            );
        }

        debug!(
            subsystem = "bot",
            user_id,
            status = %session.status,
            page = session.page,
            "Session stored"
        );
        self.sessions.set(sender.id, session);
    }

    // =========================================================================
    // COMMANDS AND FREE TEXT
    // =========================================================================

    async fn on_command(&self, ctx: Ctx, session: &mut Session, command: Command) -> Result<()> {
        debug!(subsystem = "bot", user_id = ctx.user_id, ?command, "Command");
        match command {
            Command::Start => {
                session.status = Status::None;
                self.send(
                    ctx,
                    messages::GREETING,
                    MessageOptions::plain().with_keyboard(keyboard::start_menu()),
                )
                .await
            }
            Command::New => self.begin_compose(ctx, session).await,
            Command::List => {
                session.status = Status::None;
                session.enter_list(None);
                let placeholder = self
                    .transport
                    .send_message(ctx.chat_id, messages::LOADING, MessageOptions::plain())
                    .await?;
                self.render_list(ctx, session, ListContext::All, Some(placeholder.message_id))
                    .await
            }
            Command::Tags => self.show_tags(ctx).await,
        }
    }

    async fn on_text(&self, ctx: Ctx, session: &mut Session, text: &str) -> Result<()> {
        match state::on_text(session.status, session.draft.clone(), text) {
            Step::Ignore => {
                debug!(subsystem = "bot", user_id = ctx.user_id, "Idle session, text ignored");
                Ok(())
            }
            Step::Ask {
                status,
                draft,
                prompt,
            } => {
                debug!(
                    subsystem = "bot",
                    user_id = ctx.user_id,
                    from = %session.status,
                    to = %status,
                    "State transition"
                );
                let flow = status.flow().unwrap_or(Flow::Compose);
                session.status = status;
                session.draft = draft;
                self.prompt(ctx, flow, prompt).await
            }
            Step::Finish { flow, draft } => self.finish(ctx, session, flow, draft).await,
        }
    }

    // =========================================================================
    // CALLBACK ROUTES
    // =========================================================================

    async fn on_route(
        &self,
        ctx: Ctx,
        session: &mut Session,
        route: Route,
        message_id: Option<i64>,
    ) -> Result<()> {
        debug!(subsystem = "bot", user_id = ctx.user_id, route = %route, "Route");
        match route {
            Route::ListAll => {
                session.enter_list(None);
                self.render_list(ctx, session, ListContext::All, None).await
            }
            Route::ListPrev => {
                self.flip_page(ctx, session, ListContext::All, false, message_id)
                    .await
            }
            Route::ListNext => {
                self.flip_page(ctx, session, ListContext::All, true, message_id)
                    .await
            }
            Route::SearchByTag(tag) => {
                if tag.is_empty() {
                    warn!(
                        subsystem = "bot",
                        user_id = ctx.user_id,
                        "Tag search without a tag"
                    );
                    return self.send_plain(ctx, messages::NO_TAG_SELECTED).await;
                }
                session.enter_list(Some(tag));
                self.render_list(ctx, session, ListContext::Tag, None).await
            }
            Route::SearchByTagPrev => {
                self.flip_page(ctx, session, ListContext::Tag, false, message_id)
                    .await
            }
            Route::SearchByTagNext => {
                self.flip_page(ctx, session, ListContext::Tag, true, message_id)
                    .await
            }
            Route::Show(id) => {
                self.show_note(ctx, session, id, ListContext::All, message_id)
                    .await
            }
            Route::ShowByTag(id) => {
                let context = if session.tag.is_some() {
                    ListContext::Tag
                } else {
                    ListContext::All
                };
                self.show_note(ctx, session, id, context, message_id).await
            }
            Route::New(action) => self.on_compose(ctx, session, action).await,
            Route::Edit(id) => self.begin_edit(ctx, session, id).await,
            Route::Editing(action) => self.on_editing(ctx, session, action).await,
            Route::Delete(id) => self.delete_note(ctx, session, id).await,
        }
    }

    async fn on_compose(
        &self,
        ctx: Ctx,
        session: &mut Session,
        action: ComposeAction,
    ) -> Result<()> {
        match action {
            ComposeAction::Begin => self.begin_compose(ctx, session).await,
            ComposeAction::Jump(field) => {
                session.status = Status::awaiting(Flow::Compose, field);
                self.prompt(ctx, Flow::Compose, Prompt::Field(field)).await
            }
            ComposeAction::Save => {
                let draft = session.draft.clone();
                self.finish(ctx, session, Flow::Compose, draft).await
            }
        }
    }

    async fn on_editing(
        &self,
        ctx: Ctx,
        session: &mut Session,
        action: Option<EditAction>,
    ) -> Result<()> {
        if !session.draft.is_persisted() {
            return self.send_plain(ctx, messages::NOTE_NOT_SELECTED).await;
        }
        match action {
            Some(EditAction::Jump(field)) => {
                session.status = Status::awaiting(Flow::Edit, field);
                self.prompt(ctx, Flow::Edit, Prompt::Field(field)).await
            }
            Some(EditAction::Update) => {
                let draft = session.draft.clone();
                self.finish(ctx, session, Flow::Edit, draft).await
            }
            None => {
                debug!(subsystem = "bot", user_id = ctx.user_id, "Edit shortcut without action");
                Ok(())
            }
        }
    }

    // =========================================================================
    // FLOWS
    // =========================================================================

    async fn begin_compose(&self, ctx: Ctx, session: &mut Session) -> Result<()> {
        session.status = Status::New;
        session.draft = Draft::default();
        self.prompt(ctx, Flow::Compose, Prompt::Field(Field::Title))
            .await
    }

    async fn begin_edit(&self, ctx: Ctx, session: &mut Session, id: i64) -> Result<()> {
        let Some(note) = self.owned_note(ctx, "edit", id).await? else {
            return Ok(());
        };
        let Some(tags) = self
            .stored(ctx, "get_tags_by_note", self.store.get_tags_by_note(note.id).await)
            .await?
        else {
            return Ok(());
        };

        session.draft = Draft::from_note(&note, &tags);
        session.status = Status::Edit;
        self.send(
            ctx,
            &messages::note_detail(&session.draft),
            MessageOptions::plain()
                .markdown()
                .with_keyboard(keyboard::edit_menu()),
        )
        .await
    }

    /// Persist a completed draft.
    ///
    /// On failure the draft is kept and the session resumes at the tags step,
    /// so the save or update button retries the write.
    async fn finish(&self, ctx: Ctx, session: &mut Session, flow: Flow, draft: Draft) -> Result<()> {
        let op = match flow {
            Flow::Compose => "save",
            Flow::Edit => "update",
        };
        let outcome = match flow {
            Flow::Compose => self
                .store
                .create_note_with_tags(draft.to_create_request(ctx.user_id))
                .await
                .map(|note_id| (note_id, messages::NOTE_SAVED)),
            Flow::Edit if !draft.is_persisted() => {
                session.status = Status::None;
                return self.send_plain(ctx, messages::NOTE_NOT_SELECTED).await;
            }
            Flow::Edit => self
                .store
                .update_note_with_tag_diff(&draft.to_note(ctx.user_id), &draft.tags)
                .await
                .map(|()| (draft.id, messages::NOTE_UPDATED)),
        };

        match outcome {
            Ok((note_id, confirmation)) => {
                info!(
                    subsystem = "bot",
                    component = "handlers",
                    op,
                    user_id = ctx.user_id,
                    note_id,
                    tag_count = draft.tags.len(),
                    "Note persisted"
                );
                session.status = Status::None;
                session.draft = Draft::default();
                self.send_plain(ctx, confirmation).await
            }
            Err(Error::NoteNotFound(note_id)) => {
                error!(
                    subsystem = "bot",
                    component = "handlers",
                    op,
                    user_id = ctx.user_id,
                    note_id,
                    "Update rejected: note missing or owned by another user"
                );
                session.status = Status::None;
                session.draft = Draft::default();
                self.send_plain(ctx, messages::NOTE_NOT_FOUND).await
            }
            Err(e) => {
                error!(
                    subsystem = "bot",
                    component = "handlers",
                    op,
                    user_id = ctx.user_id,
                    timeout = e.is_timeout(),
                    error = %e,
                    "Failed to persist note"
                );
                session.status = state::after_failed_finish(flow);
                session.draft = draft;
                let text = match flow {
                    Flow::Compose => messages::SAVE_ERROR,
                    Flow::Edit => messages::UPDATE_ERROR,
                };
                self.send(ctx, text, MessageOptions::plain().with_keyboard(menu(flow)))
                    .await
            }
        }
    }

    async fn delete_note(&self, ctx: Ctx, session: &mut Session, id: i64) -> Result<()> {
        let Some(note) = self.owned_note(ctx, "delete", id).await? else {
            return Ok(());
        };
        if self
            .stored(ctx, "delete_note", self.store.delete_note(note.id).await)
            .await?
            .is_none()
        {
            return Ok(());
        }

        info!(
            subsystem = "bot",
            component = "handlers",
            op = "delete",
            user_id = ctx.user_id,
            note_id = note.id,
            "Note deleted"
        );
        if session.draft.id == note.id {
            session.status = Status::None;
            session.draft = Draft::default();
        }
        self.send_plain(ctx, &messages::note_deleted(&note.title))
            .await
    }

    async fn show_note(
        &self,
        ctx: Ctx,
        session: &Session,
        id: i64,
        context: ListContext,
        message_id: Option<i64>,
    ) -> Result<()> {
        let Some(note) = self.owned_note(ctx, "show", id).await? else {
            return Ok(());
        };
        let Some(tags) = self
            .stored(ctx, "get_tags_by_note", self.store.get_tags_by_note(note.id).await)
            .await?
        else {
            return Ok(());
        };
        let Some(notes) = self
            .stored(ctx, "list_notes", self.list_notes(ctx, session, context).await)
            .await?
        else {
            return Ok(());
        };

        let text = messages::note_detail(&Draft::from_note(&note, &tags));
        let keyboard = keyboard::note_list(&notes, session.page, context);
        self.reply(
            ctx,
            message_id,
            &text,
            with_keyboard(MessageOptions::plain().markdown(), keyboard),
        )
        .await
    }

    async fn show_tags(&self, ctx: Ctx) -> Result<()> {
        let Some(tags) = self
            .stored(ctx, "get_tags_by_user", self.store.get_tags_by_user(ctx.user_id).await)
            .await?
        else {
            return Ok(());
        };
        if tags.is_empty() {
            return self.send_plain(ctx, messages::NO_TAGS).await;
        }

        let mut titles: Vec<String> = tags.into_iter().map(|t| t.title).collect();
        titles.sort_by_key(|t| t.to_lowercase());
        self.send(
            ctx,
            messages::YOUR_TAGS,
            MessageOptions::plain().with_keyboard(keyboard::tags_menu(&titles)),
        )
        .await
    }

    async fn flip_page(
        &self,
        ctx: Ctx,
        session: &mut Session,
        context: ListContext,
        forward: bool,
        message_id: Option<i64>,
    ) -> Result<()> {
        if context == ListContext::Tag && session.tag.is_none() {
            return self.send_plain(ctx, messages::NO_TAG_SELECTED).await;
        }
        session.page = if forward {
            session.page.saturating_add(1)
        } else {
            session.page.saturating_sub(1)
        };
        self.render_list(ctx, session, context, message_id).await
    }

    /// Render the session's current list page, editing `message_id` in place
    /// when given.
    async fn render_list(
        &self,
        ctx: Ctx,
        session: &Session,
        context: ListContext,
        message_id: Option<i64>,
    ) -> Result<()> {
        let Some(notes) = self
            .stored(ctx, "list_notes", self.list_notes(ctx, session, context).await)
            .await?
        else {
            return Ok(());
        };

        let keyboard = keyboard::note_list(&notes, session.page, context);
        let (text, options) = match (context, session.tag.as_deref()) {
            (ListContext::Tag, Some(tag)) => (messages::tag_header(tag), MessageOptions::plain()),
            _ => (
                messages::LIST_HEADER.to_string(),
                MessageOptions::plain().markdown(),
            ),
        };
        self.reply(ctx, message_id, &text, with_keyboard(options, keyboard))
            .await
    }

    async fn list_notes(
        &self,
        ctx: Ctx,
        session: &Session,
        context: ListContext,
    ) -> notebot_core::Result<Vec<Note>> {
        match (context, session.tag.as_deref()) {
            (ListContext::Tag, Some(tag)) => {
                self.store
                    .get_notes_by_user_and_tag(ctx.user_id, tag)
                    .await
            }
            _ => self.store.get_notes_by_user(ctx.user_id).await,
        }
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Fetch a note the current user owns.
    ///
    /// Absent and foreign notes both answer "note not found"; a foreign note
    /// is additionally logged as a security event. `Ok(None)` means the user
    /// has already been told.
    async fn owned_note(&self, ctx: Ctx, op: &'static str, id: i64) -> Result<Option<Note>> {
        let Some(found) = self
            .stored(ctx, "get_note", self.store.get_note(id).await)
            .await?
        else {
            return Ok(None);
        };

        match found {
            Some(note) if note.is_owned_by(ctx.user_id) => Ok(Some(note)),
            Some(note) => {
                error!(
                    subsystem = "bot",
                    component = "handlers",
                    op,
                    user_id = ctx.user_id,
                    note_id = note.id,
                    owner_id = note.user_id,
                    "Access to a note owned by another user"
                );
                self.send_plain(ctx, messages::NOTE_NOT_FOUND).await?;
                Ok(None)
            }
            None => {
                debug!(subsystem = "bot", op, note_id = id, "Note not found");
                self.send_plain(ctx, messages::NOTE_NOT_FOUND).await?;
                Ok(None)
            }
        }
    }

    /// Unwrap a store result, reporting a failure to the log and the user.
    async fn stored<T>(
        &self,
        ctx: Ctx,
        op: &'static str,
        result: notebot_core::Result<T>,
    ) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                error!(
                    subsystem = "bot",
                    component = "handlers",
                    op,
                    chat_id = ctx.chat_id,
                    user_id = ctx.user_id,
                    error = %e,
                    "Storage operation failed"
                );
                self.send_plain(ctx, messages::SERVER_ERROR).await?;
                Ok(None)
            }
        }
    }

    async fn prompt(&self, ctx: Ctx, flow: Flow, prompt: Prompt) -> Result<()> {
        self.send(
            ctx,
            messages::prompt(prompt),
            MessageOptions::plain().with_keyboard(menu(flow)),
        )
        .await
    }

    async fn send_plain(&self, ctx: Ctx, text: &str) -> Result<()> {
        self.send(ctx, text, MessageOptions::plain()).await
    }

    async fn send(&self, ctx: Ctx, text: &str, options: MessageOptions) -> Result<()> {
        self.transport
            .send_message(ctx.chat_id, text, options)
            .await
            .map(|_| ())
    }

    /// Edit `message_id` when known, otherwise send a new message.
    async fn reply(
        &self,
        ctx: Ctx,
        message_id: Option<i64>,
        text: &str,
        options: MessageOptions,
    ) -> Result<()> {
        match message_id {
            Some(message_id) => {
                self.transport
                    .edit_message(ctx.chat_id, message_id, text, options)
                    .await
            }
            None => self.send(ctx, text, options).await,
        }
    }
}

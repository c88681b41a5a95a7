// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# zipcover Service Layer

The application boundary for zipcover. A front end (map page, CLI, HTTP
adapter) talks to `CoverageContext` and never to the catalog or cache
directly.

## Architecture

```text
┌─────────────────────────────────────────────────────────────────┐
│                        FRONT ENDS                               │
│  Map page, zipcover_select CLI, ...                             │
└────────────────────────────┬────────────────────────────────────┘
                             ↓
┌─────────────────────────────────────────────────────────────────┐
│              SERVICE LAYER (This Crate)                         │
│  • CoverageContext  - selection, highlight, territory overview  │
│  • EntityStore      - roster persistence (JSON file, memory)    │
│  • RenderPlan/Sink  - what a map should draw                    │
│  • export           - comma-joined code lists, clipboard copy   │
└────────────────────────────┬────────────────────────────────────┘
                             ↓
┌─────────────────────────────────────────────────────────────────┐
│                   ALGORITHM LAYER                               │
│  zipcover-spatial, zipcover-union, zipcover-structures          │
└─────────────────────────────────────────────────────────────────┘
```

Lower-layer errors are translated to `ServiceError` at this boundary.
*/

pub mod context;
pub mod error;
pub mod export;
pub mod render;
pub mod roster;
pub mod store;

pub use context::{
    ContextSettings, CoverageContext, EntityView, SelectionView, TerritoryView, DEFAULT_EDGE_THRESHOLD,
};
pub use error::{ServiceError, ServiceResult};
pub use export::{
    copied_message, copy_codes, export_codes, Clipboard, ExportError, FileClipboard,
    MemoryClipboard,
};
pub use render::{palette_color, Label, PlanKind, RenderPlan, RenderSink, COLORS, SELECTION_COLOR};
pub use roster::{default_roster, filter_entities};
pub use store::{EntityStore, InMemoryEntityStore, JsonFileEntityStore};

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

mod topic_monitor_tests;
